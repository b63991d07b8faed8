//! Task record consumed by the scoring engine and the cycle detector.
//!
//! Records are created fresh per call; nothing here is persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMPORTANCE: u8 = 5;
pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 10;

fn default_importance() -> u8 {
    DEFAULT_IMPORTANCE
}

/// A single task in a scoring batch.
///
/// `id` is optional; when it is missing (or empty) the title stands in for it,
/// see [`Task::key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub title: String,

    /// Calendar date, no time zone. Unparsable values deserialize to `None`.
    #[serde(default, with = "crate::time::lenient_date")]
    pub due_date: Option<NaiveDate>,

    /// Hours, >= 0.
    #[serde(default)]
    pub estimated_hours: f64,

    /// 1-10, higher means more important.
    #[serde(default = "default_importance")]
    pub importance: u8,

    /// Keys of tasks in the same batch this task waits on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            due_date: None,
            estimated_hours: 0.0,
            importance: DEFAULT_IMPORTANCE,
            dependencies: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = hours;
        self
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Identifier used for graph nodes and fan-in counting.
    pub fn key(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.title,
        }
    }

    /// Importance clamped into 1..=10.
    pub fn effective_importance(&self) -> u8 {
        self.importance.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE)
    }

    /// Estimated hours, with negative or non-finite values read as 0.
    pub fn effective_hours(&self) -> f64 {
        if self.estimated_hours.is_finite() && self.estimated_hours > 0.0 {
            self.estimated_hours
        } else {
            0.0
        }
    }
}
