//! Time utilities: "today" in a configured zone and lenient due-date parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;

/// Parse an IANA zone name like "America/Chicago".
pub fn parse_timezone(tz: &str) -> Result<Tz, CoreError> {
    tz.parse()
        .map_err(|_| CoreError::InvalidTimezone(tz.to_string()))
}

/// Calendar date at `now` as seen from `tz`.
pub fn date_in(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Current calendar date in `tz`. Read this once per scoring call.
pub fn today_in(tz: Tz) -> NaiveDate {
    date_in(Utc::now(), tz)
}

/// Parse a due date, keeping only the calendar part.
///
/// Accepts `2025-03-04`, `2025-03-04T09:30[:00]` and RFC 3339 timestamps.
/// Returns `None` for anything else.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.date());
        }
    }
    None
}

/// Serde adapter for `Option<NaiveDate>` that degrades bad input to `None`.
pub mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        let parsed = match raw {
            Some(serde_json::Value::String(s)) => {
                let d = super::parse_due_date(&s);
                if d.is_none() {
                    tracing::warn!(due_date = %s, "unparsable due date treated as absent");
                }
                d
            }
            _ => None,
        };
        Ok(parsed)
    }
}
