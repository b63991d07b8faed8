//! Multi-factor priority scoring.
//!
//! Each task gets four normalized factors:
//! - urgency: business days until due, with an overdue boost up to 3.0
//! - importance: 1..=10 mapped onto [0, 1]
//! - effort: log-damped inverse of estimated hours, in (0, 1]
//! - dependency: share of the batch waiting on this task
//!
//! The raw score is the weighted sum of the factors; the display score is the
//! raw score times 100, rounded to two decimals. Ranking always uses the raw
//! score.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{days_until_due, HolidayCalendar};
use crate::error::CoreError;
use crate::task::Task;

/// Business days at which urgency bottoms out at 0.
pub const MAX_URGENCY_DAYS: i64 = 30;
/// Overdue business days per +1.0 of urgency boost.
pub const OVERDUE_DAYS_PER_POINT: f64 = 5.0;
/// Ceiling of the overdue boost above the 1.0 baseline.
pub const MAX_OVERDUE_BOOST: f64 = 2.0;

/// Factor weights. Missing fields deserialize to the defaults, so a partial
/// table of caller overrides merges onto the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub urgency: f64,
    pub importance: f64,
    pub effort: f64,
    pub dependency: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            urgency: 0.40,
            importance: 0.35,
            effort: 0.15,
            dependency: 0.10,
        }
    }
}

impl Weights {
    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("urgency", self.urgency),
            ("importance", self.importance),
            ("effort", self.effort),
            ("dependency", self.dependency),
        ]
    }

    /// Reject negative or non-finite weights.
    pub fn check(self) -> Result<Self, CoreError> {
        match self.named().into_iter().find(|(_, v)| !(v.is_finite() && *v >= 0.0)) {
            Some((name, value)) => Err(CoreError::InvalidWeight { name, value }),
            None => Ok(self),
        }
    }
}

/// Named weight-adjustment preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Strategy {
    /// Weights as given.
    #[default]
    Smart,
    /// Favor low-effort tasks.
    Fastest,
    /// Favor important tasks.
    Impact,
    /// Favor tasks close to their due date.
    Deadline,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Smart,
        Strategy::Fastest,
        Strategy::Impact,
        Strategy::Deadline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Smart => "smart",
            Strategy::Fastest => "fastest",
            Strategy::Impact => "impact",
            Strategy::Deadline => "deadline",
        }
    }

    /// Parse a strategy name. Unknown names fall back to `Smart`.
    pub fn parse_lenient(name: &str) -> Self {
        let wanted = name.trim().to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|s| s.as_str() == wanted)
            .unwrap_or_else(|| {
                tracing::debug!(strategy = %wanted, "unknown strategy, using smart");
                Strategy::Smart
            })
    }

    /// Comma-separated names of every strategy.
    pub fn names() -> String {
        Strategy::ALL.map(Strategy::as_str).join(", ")
    }

    /// Adjust `w` for this strategy. "Raised to at least x" is `max(w, x)`.
    pub fn apply(self, w: Weights) -> Weights {
        match self {
            Strategy::Smart => w,
            Strategy::Fastest => Weights {
                effort: w.effort.max(0.5),
                urgency: w.urgency * 0.5,
                importance: w.importance * 0.5,
                ..w
            },
            Strategy::Impact => Weights {
                importance: w.importance.max(0.6),
                effort: w.effort * 0.4,
                ..w
            },
            Strategy::Deadline => Weights {
                urgency: w.urgency.max(0.7),
                importance: w.importance * 0.6,
                ..w
            },
        }
    }
}

impl From<&str> for Strategy {
    fn from(s: &str) -> Self {
        Strategy::parse_lenient(s)
    }
}

impl From<String> for Strategy {
    fn from(s: String) -> Self {
        Strategy::parse_lenient(&s)
    }
}

impl FromStr for Strategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Strategy::parse_lenient(s))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(importance - 1) / 9`, so 1 maps to 0 and 10 maps to 1.
pub fn importance_norm(importance: u8) -> f64 {
    (f64::from(importance) - 1.0) / 9.0
}

/// `1 / (1 + ln(1 + hours + 1))`. Strictly decreasing in `hours`, in (0, 1].
pub fn effort_norm(hours: f64) -> f64 {
    1.0 / (1.0 + (hours + 1.0).ln_1p())
}

/// Urgency from a business-day distance; `None` (no due date) is 0.
///
/// Not overdue: `1 - min(bd, 30) / 30`. Overdue: `1 + min(|bd| / 5, 2)`.
pub fn urgency_norm(business_days: Option<i64>) -> f64 {
    match business_days {
        None => 0.0,
        Some(bd) if bd < 0 => {
            1.0 + (bd.unsigned_abs() as f64 / OVERDUE_DAYS_PER_POINT).min(MAX_OVERDUE_BOOST)
        }
        Some(bd) => 1.0 - bd.min(MAX_URGENCY_DAYS) as f64 / MAX_URGENCY_DAYS as f64,
    }
}

/// `min(dependents / max(1, batch_size), 1)`.
pub fn dependency_norm(dependents: usize, batch_size: usize) -> f64 {
    (dependents as f64 / batch_size.max(1) as f64).min(1.0)
}

/// The four normalized factor values behind a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub urgency_norm: f64,
    pub importance_norm: f64,
    pub effort_norm: f64,
    pub dependency_norm: f64,
}

impl FactorBreakdown {
    /// Weighted sum of the factors.
    pub fn weighted(&self, w: &Weights) -> f64 {
        w.urgency * self.urgency_norm
            + w.importance * self.importance_norm
            + w.effort * self.effort_norm
            + w.dependency * self.dependency_norm
    }
}

/// A task with its score and the reasoning behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTask {
    /// The input record, with `id` set to its resolved key.
    #[serde(flatten)]
    pub task: Task,
    /// `raw_score * 100` rounded to 2 decimals.
    pub score: f64,
    pub raw_score: f64,
    pub days_until_due: Option<i64>,
    /// Number of other tasks in the batch depending on this one.
    pub depended_by: usize,
    #[serde(rename = "_meta")]
    pub factors: FactorBreakdown,
    pub explanation: String,
}

impl ScoredTask {
    /// Resolved key (id, or title when the input had no id).
    pub fn id(&self) -> &str {
        self.task.key()
    }
}

/// Scores batches of tasks with a fixed weight set and holiday calendar.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: Weights,
    strategy: Strategy,
    calendar: HolidayCalendar,
}

impl ScoringEngine {
    pub fn new(weights: Weights, strategy: Strategy) -> Self {
        Self {
            weights,
            strategy,
            calendar: HolidayCalendar::default(),
        }
    }

    pub fn with_calendar(mut self, calendar: HolidayCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Weights after the strategy adjustment.
    pub fn effective_weights(&self) -> Weights {
        self.strategy.apply(self.weights)
    }

    /// Score every task and sort by raw score, highest first.
    ///
    /// `today` anchors all urgency calculations of the call. Equal scores keep
    /// their input order.
    pub fn score(&self, tasks: &[Task], today: NaiveDate) -> Vec<ScoredTask> {
        let weights = self.effective_weights();
        let fan_in = dependents_by_key(tasks);

        let mut scored: Vec<ScoredTask> = tasks
            .iter()
            .map(|t| {
                let key = t.key();
                let depended_by = fan_in.get(key).copied().unwrap_or(0);
                let bd = t
                    .due_date
                    .map(|due| self.calendar.business_days_between(today, due));
                let days = days_until_due(t.due_date, today);

                let hours = t.effective_hours();
                let factors = FactorBreakdown {
                    urgency_norm: urgency_norm(bd),
                    importance_norm: importance_norm(t.effective_importance()),
                    effort_norm: effort_norm(hours),
                    dependency_norm: dependency_norm(depended_by, tasks.len()),
                };
                let raw_score = factors.weighted(&weights);

                let mut task = t.clone();
                task.id = Some(key.to_string());

                ScoredTask {
                    task,
                    score: round2(raw_score * 100.0),
                    raw_score,
                    days_until_due: days,
                    depended_by,
                    explanation: explain(&factors, days, hours, depended_by),
                    factors,
                }
            })
            .collect();

        // sort_by is stable, so ties keep input order.
        scored.sort_by(|a, b| b.raw_score.total_cmp(&a.raw_score));

        tracing::debug!(
            tasks = scored.len(),
            strategy = %self.strategy,
            top = scored.first().map(ScoredTask::id).unwrap_or("-"),
            "scored batch"
        );

        scored
    }
}

/// Score `tasks` against the current local date.
///
/// `weights` overrides the defaults when given. The date is read once.
pub fn compute_scores(
    tasks: &[Task],
    weights: Option<Weights>,
    strategy: Strategy,
) -> Vec<ScoredTask> {
    let today = chrono::Local::now().date_naive();
    compute_scores_on(tasks, weights, strategy, today)
}

/// Same as [`compute_scores`] with an explicit "today".
pub fn compute_scores_on(
    tasks: &[Task],
    weights: Option<Weights>,
    strategy: Strategy,
    today: NaiveDate,
) -> Vec<ScoredTask> {
    ScoringEngine::new(weights.unwrap_or_default(), strategy).score(tasks, today)
}

/// Distinct other tasks that list each key as a dependency.
fn dependents_by_key(tasks: &[Task]) -> HashMap<&str, usize> {
    let keys: HashSet<&str> = tasks.iter().map(Task::key).collect();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for t in tasks {
        let from = t.key();
        for dep in &t.dependencies {
            let dep = dep.trim();
            let Some(&to) = keys.get(dep) else { continue };
            if to == from || !seen.insert((from, to)) {
                continue;
            }
            *counts.entry(to).or_default() += 1;
        }
    }
    counts
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn explain(f: &FactorBreakdown, days: Option<i64>, hours: f64, depended_by: usize) -> String {
    let days = days.map_or_else(|| "none".to_string(), |d| d.to_string());
    format!(
        "urgency={:?} (days_until_due={}); importance={:?}; effort={:?} (est_hours={:?}); dependency={:?} (depended_by={})",
        round3(f.urgency_norm),
        days,
        round3(f.importance_norm),
        round3(f.effort_norm),
        hours,
        round3(f.dependency_norm),
        depended_by,
    )
}
