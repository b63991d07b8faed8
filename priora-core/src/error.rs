//! Error types for priora-core.
//!
//! Scoring, cycle detection and calendar arithmetic never fail; errors only
//! come from the intake layer that enforces the caller contract.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Payload is neither a task array nor a `{ "tasks": [...] }` object.
    #[error("expected a JSON array of tasks or an object with a \"tasks\" field: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// One or more task records failed validation.
    #[error("validation errors:\n{}", render_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("batch of {size} tasks exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// The dependency graph contains at least one loop.
    #[error("circular dependencies detected: {}", render_cycles(.0))]
    CircularDependencies(Vec<Vec<String>>),

    #[error("weight '{name}' must be a non-negative finite number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// A single rejected field, tagged with the task's position in the batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub index: usize,
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(index: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            index,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task[{}].{}: {}", self.index, self.field, self.message)
    }
}

fn render_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|c| c.join(" -> "))
        .collect::<Vec<_>>()
        .join("; ")
}
