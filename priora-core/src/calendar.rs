//! Calendar arithmetic: days until due and business-day counting.
//!
//! A business day is a weekday that is not a holiday. Holidays come in two
//! kinds: annual fixed dates (month/day, every year) and one-off dates.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Years after which both the leap-year rule and weekdays repeat.
const GREGORIAN_CYCLE_YEARS: i32 = 400;

/// Fixed-date holidays observed every year: New Year's Day, Aug 15, Christmas.
pub const DEFAULT_ANNUAL_HOLIDAYS: [(u32, u32); 3] = [(1, 1), (8, 15), (12, 25)];

/// A month/day pair that recurs every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnnualHoliday {
    pub month: u32,
    pub day: u32,
}

impl AnnualHoliday {
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so Feb 29 is accepted.
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }

    /// Parse "MM-DD".
    pub fn parse(s: &str) -> Option<Self> {
        let (m, d) = s.trim().split_once('-')?;
        Self::new(m.parse().ok()?, d.parse().ok()?)
    }

    fn matches(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }

    fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    fn on_weekday_in(&self, year: i32) -> bool {
        self.in_year(year).is_some_and(is_weekday)
    }

    /// Occurrences in `[start, end)` that fall on a weekday.
    ///
    /// Cost is bounded by one Gregorian cycle however long the interval is.
    fn weekday_occurrences(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let inside = |year: i32| {
            self.in_year(year)
                .is_some_and(|d| d >= start && d < end && is_weekday(d))
        };
        let (first, last) = (start.year(), end.year());
        if first == last {
            return i64::from(inside(first));
        }

        let mut count = i64::from(inside(first)) + i64::from(inside(last));
        // Years strictly between the two ends are covered in full.
        let (lo, hi) = (first + 1, last - 1);
        if lo <= hi {
            let cycles = (hi - lo + 1) / GREGORIAN_CYCLE_YEARS;
            if cycles > 0 {
                let per_cycle = (lo..lo + GREGORIAN_CYCLE_YEARS)
                    .filter(|&y| self.on_weekday_in(y))
                    .count() as i64;
                count += i64::from(cycles) * per_cycle;
            }
            let tail = lo + cycles * GREGORIAN_CYCLE_YEARS;
            count += (tail..=hi).filter(|&y| self.on_weekday_in(y)).count() as i64;
        }
        count
    }
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday-to-Friday days in `[start, end)`, `start <= end`.
fn weekdays_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let days = (end - start).num_days();
    let first = i64::from(start.weekday().num_days_from_monday());
    let partial = (0..days % 7).filter(|i| (first + i) % 7 < 5).count() as i64;
    days / 7 * 5 + partial
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayCalendar {
    annual: BTreeSet<AnnualHoliday>,
    dates: BTreeSet<NaiveDate>,
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        let annual = DEFAULT_ANNUAL_HOLIDAYS
            .iter()
            .filter_map(|&(m, d)| AnnualHoliday::new(m, d))
            .collect();
        Self {
            annual,
            dates: BTreeSet::new(),
        }
    }
}

impl HolidayCalendar {
    /// Calendar with no holidays; only weekends are excluded.
    pub fn weekends_only() -> Self {
        Self {
            annual: BTreeSet::new(),
            dates: BTreeSet::new(),
        }
    }

    pub fn with_annual(mut self, holiday: AnnualHoliday) -> Self {
        self.annual.insert(holiday);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.dates.insert(date);
        self
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date) || self.annual.iter().any(|h| h.matches(date))
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        is_weekday(date) && !self.is_holiday(date)
    }

    /// Business days in `[start, end)`.
    ///
    /// When `start > end` the result is the negated count of `[end, start)`, so
    /// `business_days_between(a, b) == -business_days_between(b, a)`.
    ///
    /// Computed in closed form: weekdays in the interval minus the holidays
    /// landing on them, so distant dates cost no more than near ones.
    pub fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if start > end {
            return -self.business_days_between(end, start);
        }

        let annual: i64 = self
            .annual
            .iter()
            .map(|h| h.weekday_occurrences(start, end))
            .sum();
        // One-off dates that coincide with an annual holiday are already counted.
        let one_off = self
            .dates
            .range(start..end)
            .filter(|&&d| is_weekday(d) && !self.annual.iter().any(|h| h.matches(d)))
            .count() as i64;

        weekdays_between(start, end) - annual - one_off
    }

    /// Like [`Self::business_days_between`], but `None` when either side is unknown.
    pub fn business_days_between_opt(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Option<i64> {
        Some(self.business_days_between(start?, end?))
    }
}

/// Calendar days from `today` until `due`; `None` without a due date.
pub fn days_until_due(due: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    due.map(|d| (d - today).num_days())
}
