//! priora-core: task priority scoring, dependency cycle detection and
//! business-day calendar arithmetic.
//!
//! Everything here is a pure function of its inputs plus "today", which the
//! caller reads once per call.

pub mod calendar;
pub mod error;
pub mod graph;
pub mod intake;
pub mod scoring;
pub mod suggest;
pub mod task;
pub mod time;

pub use calendar::{days_until_due, AnnualHoliday, HolidayCalendar, DEFAULT_ANNUAL_HOLIDAYS};
pub use error::{CoreError, FieldError};
pub use graph::{detect_cycles, DependencyGraph, GraphEdge, GraphNode, GraphSummary};
pub use intake::{
    analyze, resolve_dependencies, suggest, validate_batch, AnalyzeOptions, Analysis, Payload,
    TaskInput, DEFAULT_MAX_BATCH_SIZE,
};
pub use scoring::{
    compute_scores, compute_scores_on, FactorBreakdown, ScoredTask, ScoringEngine, Strategy,
    Weights,
};
pub use suggest::{select_suggestions, Reason, Suggestion, DEFAULT_SUGGESTION_LIMIT};
pub use task::Task;
pub use time::{parse_due_date, parse_timezone, today_in};
