//! Intake: turning loosely typed task payloads into a validated batch and
//! running the analyze / suggest pipelines over it.
//!
//! Pipeline:
//! 1) validate every record (errors are collected, not short-circuited)
//! 2) rewrite title-based dependency references to task keys
//! 3) reject the batch if the dependency graph has cycles
//! 4) score, and optionally pick suggestions

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::HolidayCalendar;
use crate::error::{CoreError, FieldError};
use crate::graph::{detect_cycles, DependencyGraph, GraphSummary};
use crate::scoring::{ScoredTask, ScoringEngine, Strategy, Weights};
use crate::suggest::{select_suggestions, Suggestion, DEFAULT_SUGGESTION_LIMIT};
use crate::task::{Task, MAX_IMPORTANCE, MIN_IMPORTANCE};
use crate::time::parse_due_date;

/// Upper bound on tasks per call unless configured otherwise.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 5_000;

/// A task record as it arrives from outside, before validation.
///
/// Every field is kept as raw JSON so that a badly typed value is reported
/// against its task index instead of failing the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    /// String or number; numbers are stringified.
    #[serde(default)]
    pub id: Option<Value>,
    /// String or number.
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub due_date: Option<Value>,
    /// Number or numeric string.
    #[serde(default)]
    pub estimated_hours: Option<Value>,
    /// Integer, integral float (`5.0`) or integer string.
    #[serde(default)]
    pub importance: Option<Value>,
    /// Array of strings or numbers.
    #[serde(default)]
    pub dependencies: Option<Value>,
}

/// Either a bare array of tasks or an envelope carrying options too.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    List(Vec<TaskInput>),
    Envelope {
        tasks: Vec<TaskInput>,
        weights: Option<Weights>,
        strategy: Option<Strategy>,
    },
}

#[derive(Deserialize)]
struct Envelope {
    tasks: Vec<TaskInput>,
    #[serde(default)]
    weights: Option<Weights>,
    #[serde(default)]
    strategy: Option<Strategy>,
}

impl Payload {
    /// Parse a payload. Envelope weights must be non-negative and finite.
    pub fn from_json(s: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(s)?;
        if value.is_array() {
            return Ok(Payload::List(serde_json::from_value(value)?));
        }

        let Envelope {
            tasks,
            weights,
            strategy,
        } = serde_json::from_value(value)?;
        let weights = weights.map(Weights::check).transpose()?;
        Ok(Payload::Envelope {
            tasks,
            weights,
            strategy,
        })
    }

    /// Split into tasks and the options the envelope carried, if any.
    pub fn into_parts(self) -> (Vec<TaskInput>, Option<Weights>, Option<Strategy>) {
        match self {
            Payload::List(tasks) => (tasks, None, None),
            Payload::Envelope {
                tasks,
                weights,
                strategy,
            } => (tasks, weights, strategy),
        }
    }
}

/// `None` for an absent field or explicit null.
fn present(v: &Option<Value>) -> Option<&Value> {
    v.as_ref().filter(|v| !v.is_null())
}

fn value_to_key(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    // Beyond 2^53 an f64 no longer pins down a single integer.
    (f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

/// Integers, integral floats and strings holding either.
fn coerce_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

/// Numbers and numeric strings.
fn coerce_float(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Validate a batch and convert it into core task records.
///
/// Rejects: missing or blank titles, importance outside 1..=10, negative or
/// non-finite hours, malformed due dates, non-scalar ids or dependency
/// references, duplicate keys, and batches larger than `max_batch_size`.
pub fn validate_batch(
    inputs: Vec<TaskInput>,
    max_batch_size: usize,
) -> Result<Vec<Task>, CoreError> {
    if inputs.len() > max_batch_size {
        return Err(CoreError::BatchTooLarge {
            size: inputs.len(),
            limit: max_batch_size,
        });
    }

    let mut errors = Vec::new();
    let mut tasks = Vec::with_capacity(inputs.len());
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (index, input) in inputs.into_iter().enumerate() {
        let before = errors.len();

        let title = match present(&input.title) {
            None => String::new(),
            Some(v) => value_to_key(v).unwrap_or_else(|| {
                errors.push(FieldError::new(index, "title", format!("must be a string, got {v}")));
                String::new()
            }),
        };
        if title.is_empty() && errors.len() == before {
            errors.push(FieldError::new(index, "title", "task must have a non-empty title"));
        }

        let id = match present(&input.id) {
            None => None,
            Some(v) => match value_to_key(v) {
                Some(id) => Some(id),
                None => {
                    errors.push(FieldError::new(index, "id", "must be a string or number"));
                    None
                }
            },
        };

        let importance = match present(&input.importance).map(|v| (v, coerce_integer(v))) {
            None => crate::task::DEFAULT_IMPORTANCE,
            Some((v, None)) => {
                errors.push(FieldError::new(
                    index,
                    "importance",
                    format!("must be an integer, got {v}"),
                ));
                crate::task::DEFAULT_IMPORTANCE
            }
            Some((_, Some(i)))
                if (i64::from(MIN_IMPORTANCE)..=i64::from(MAX_IMPORTANCE)).contains(&i) =>
            {
                i as u8
            }
            Some((_, Some(i))) => {
                errors.push(FieldError::new(
                    index,
                    "importance",
                    format!("must be between {MIN_IMPORTANCE} and {MAX_IMPORTANCE}, got {i}"),
                ));
                crate::task::DEFAULT_IMPORTANCE
            }
        };

        let estimated_hours = match present(&input.estimated_hours).map(|v| (v, coerce_float(v))) {
            None => 0.0,
            Some((v, None)) => {
                errors.push(FieldError::new(
                    index,
                    "estimated_hours",
                    format!("must be a number, got {v}"),
                ));
                0.0
            }
            Some((_, Some(h))) if h.is_finite() && h >= 0.0 => h,
            Some((_, Some(h))) => {
                errors.push(FieldError::new(
                    index,
                    "estimated_hours",
                    format!("must be a non-negative number, got {h}"),
                ));
                0.0
            }
        };

        let due_date: Option<NaiveDate> = match present(&input.due_date) {
            None => None,
            Some(Value::String(raw)) if raw.trim().is_empty() => None,
            Some(Value::String(raw)) => match parse_due_date(raw.trim()) {
                Some(d) => Some(d),
                None => {
                    errors.push(FieldError::new(
                        index,
                        "due_date",
                        format!("'{}' is not a valid date (expected YYYY-MM-DD)", raw.trim()),
                    ));
                    None
                }
            },
            Some(v) => {
                errors.push(FieldError::new(
                    index,
                    "due_date",
                    format!("must be a date string, got {v}"),
                ));
                None
            }
        };

        let deps: &[Value] = match present(&input.dependencies) {
            None => &[],
            Some(Value::Array(items)) => items,
            Some(v) => {
                errors.push(FieldError::new(
                    index,
                    "dependencies",
                    format!("must be a list, got {v}"),
                ));
                &[]
            }
        };
        let mut dependencies = Vec::with_capacity(deps.len());
        for dep in deps {
            match value_to_key(dep) {
                Some(d) if !d.is_empty() => dependencies.push(d),
                Some(_) => {}
                None => errors.push(FieldError::new(
                    index,
                    "dependencies",
                    "entries must be strings or numbers",
                )),
            }
        }

        if errors.len() > before {
            continue;
        }

        let task = Task {
            id,
            title,
            due_date,
            estimated_hours,
            importance,
            dependencies,
        };

        if let Some(&other) = first_seen.get(task.key()) {
            errors.push(FieldError::new(
                index,
                "id",
                format!("duplicate identifier '{}' (first used by task {other})", task.key()),
            ));
            continue;
        }
        first_seen.insert(task.key().to_string(), index);
        tasks.push(task);
    }

    if errors.is_empty() {
        Ok(tasks)
    } else {
        Err(CoreError::Validation(errors))
    }
}

/// Rewrite dependency references that name a task title to that task's key.
///
/// References matching neither a title nor a key are kept verbatim.
pub fn resolve_dependencies(tasks: &mut [Task]) {
    let title_to_key: HashMap<String, String> = tasks
        .iter()
        .map(|t| (t.title.clone(), t.key().to_string()))
        .collect();
    let keys: HashSet<String> = tasks.iter().map(|t| t.key().to_string()).collect();

    for t in tasks.iter_mut() {
        for dep in t.dependencies.iter_mut() {
            if keys.contains(dep.as_str()) {
                continue;
            }
            if let Some(key) = title_to_key.get(dep.as_str()) {
                *dep = key.clone();
            }
        }
    }
}

/// Options shared by [`analyze`] and [`suggest`].
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub weights: Weights,
    pub strategy: Strategy,
    pub calendar: HolidayCalendar,
    pub suggestion_limit: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            strategy: Strategy::Smart,
            calendar: HolidayCalendar::default(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

impl AnalyzeOptions {
    fn engine(&self) -> ScoringEngine {
        ScoringEngine::new(self.weights, self.strategy).with_calendar(self.calendar.clone())
    }
}

/// Ranked tasks plus graph metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub tasks: Vec<ScoredTask>,
    /// Always empty: cyclic batches are rejected before scoring.
    pub cycles: Vec<Vec<String>>,
    pub graph: GraphSummary,
}

fn checked_batch(
    mut tasks: Vec<Task>,
    options: &AnalyzeOptions,
) -> Result<Vec<Task>, CoreError> {
    options.weights.check()?;
    resolve_dependencies(&mut tasks);
    let cycles = detect_cycles(&tasks);
    if !cycles.is_empty() {
        return Err(CoreError::CircularDependencies(cycles));
    }
    Ok(tasks)
}

/// Check the weights, resolve, check for cycles, score, and attach the
/// dependency graph.
pub fn analyze(
    tasks: Vec<Task>,
    options: &AnalyzeOptions,
    today: NaiveDate,
) -> Result<Analysis, CoreError> {
    let tasks = checked_batch(tasks, options)?;
    let scored = options.engine().score(&tasks, today);
    let graph = DependencyGraph::from_tasks(&tasks).summary();

    Ok(Analysis {
        tasks: scored,
        cycles: Vec::new(),
        graph,
    })
}

/// Resolve, check for cycles, score, and return the top suggestions.
pub fn suggest(
    tasks: Vec<Task>,
    options: &AnalyzeOptions,
    today: NaiveDate,
) -> Result<Vec<Suggestion>, CoreError> {
    let tasks = checked_batch(tasks, options)?;
    let scored = options.engine().score(&tasks, today);
    Ok(select_suggestions(&scored, options.suggestion_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(v: serde_json::Value) -> Vec<TaskInput> {
        serde_json::from_value(v).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[test]
    fn accepts_array_and_envelope_payloads() {
        let p = Payload::from_json(r#"[{"title":"A"}]"#).unwrap();
        let (tasks, weights, strategy) = p.into_parts();
        assert_eq!(tasks.len(), 1);
        assert!(weights.is_none() && strategy.is_none());

        let p = Payload::from_json(
            r#"{"tasks":[{"title":"A"}],"weights":{"effort":0.8},"strategy":"fastest"}"#,
        )
        .unwrap();
        let (tasks, weights, strategy) = p.into_parts();
        assert_eq!(tasks.len(), 1);
        assert_eq!(weights.unwrap().effort, 0.8);
        assert_eq!(weights.unwrap().urgency, 0.4);
        assert_eq!(strategy, Some(Strategy::Fastest));
    }

    #[test]
    fn rejects_unrecognised_payload() {
        assert!(matches!(
            Payload::from_json(r#""hello""#),
            Err(CoreError::InvalidPayload(_))
        ));
        assert!(matches!(
            Payload::from_json(r#"{"items": []}"#),
            Err(CoreError::InvalidPayload(_))
        ));
    }

    #[test]
    fn collects_every_field_error() {
        let err = validate_batch(
            inputs(json!([
                {"title": "  "},
                {"title": "B", "importance": 11, "estimated_hours": -1},
                {"title": "C", "due_date": "tomorrow"},
                {"title": "D", "dependencies": [{"x": 1}]},
                {"title": "E"}
            ])),
            DEFAULT_MAX_BATCH_SIZE,
        )
        .unwrap_err();

        let CoreError::Validation(errors) = err else { panic!("expected validation error") };
        let fields: Vec<(usize, &str)> = errors.iter().map(|e| (e.index, e.field)).collect();
        assert_eq!(
            fields,
            vec![
                (0, "title"),
                (1, "importance"),
                (1, "estimated_hours"),
                (2, "due_date"),
                (3, "dependencies"),
            ]
        );
    }

    #[test]
    fn badly_typed_field_is_reported_against_its_task() {
        let payload = Payload::from_json(r#"[{"title":"A","importance":"high"},{"title":"B"}]"#)
            .unwrap();
        let (inputs, _, _) = payload.into_parts();
        let err = validate_batch(inputs, DEFAULT_MAX_BATCH_SIZE).unwrap_err();
        let CoreError::Validation(errors) = err else { panic!("expected validation error") };
        assert_eq!(errors.len(), 1);
        assert_eq!((errors[0].index, errors[0].field), (0, "importance"));
        assert!(errors[0].message.contains("\"high\""));
    }

    #[test]
    fn integral_floats_and_numeric_strings_are_coerced() {
        let payload = Payload::from_json(
            r#"{"tasks":[
                {"title":"A","importance":5.0,"estimated_hours":"3"},
                {"title":42,"importance":" 7 ","estimated_hours":1}
            ]}"#,
        )
        .unwrap();
        let (inputs, _, _) = payload.into_parts();
        let tasks = validate_batch(inputs, DEFAULT_MAX_BATCH_SIZE).unwrap();
        assert_eq!(tasks[0].importance, 5);
        assert_eq!(tasks[0].estimated_hours, 3.0);
        assert_eq!(tasks[1].title, "42");
        assert_eq!(tasks[1].importance, 7);
        assert_eq!(tasks[1].estimated_hours, 1.0);
    }

    #[test]
    fn wrong_shapes_are_field_errors() {
        let err = validate_batch(
            inputs(json!([
                {"title": "A", "importance": 5.5, "due_date": 20250101, "dependencies": "B"},
                {"title": true, "estimated_hours": "lots"},
                {"title": "C", "importance": null, "due_date": null}
            ])),
            DEFAULT_MAX_BATCH_SIZE,
        )
        .unwrap_err();
        let CoreError::Validation(errors) = err else { panic!("expected validation error") };
        let fields: Vec<(usize, &str)> = errors.iter().map(|e| (e.index, e.field)).collect();
        assert_eq!(
            fields,
            vec![
                (0, "importance"),
                (0, "due_date"),
                (0, "dependencies"),
                (1, "title"),
                (1, "estimated_hours"),
            ]
        );
    }

    #[test]
    fn envelope_weights_must_be_non_negative() {
        let err = Payload::from_json(r#"{"tasks":[{"title":"A"}],"weights":{"urgency":-5}}"#)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidWeight { name: "urgency", .. }));
    }

    #[test]
    fn pipelines_reject_negative_weights() {
        let options = AnalyzeOptions {
            weights: Weights {
                importance: -0.35,
                ..Weights::default()
            },
            ..Default::default()
        };
        let tasks = vec![Task::new("A")];
        assert!(matches!(
            analyze(tasks.clone(), &options, today()),
            Err(CoreError::InvalidWeight { name: "importance", .. })
        ));
        assert!(matches!(
            suggest(tasks, &options, today()),
            Err(CoreError::InvalidWeight { name: "importance", .. })
        ));
    }

    #[test]
    fn converts_valid_records() {
        let tasks = validate_batch(
            inputs(json!([
                {"id": 7, "title": " Write ", "due_date": "2025-03-10", "estimated_hours": 2.5,
                 "importance": 8, "dependencies": [3, "Read", ""]},
                {"title": "Read"}
            ])),
            DEFAULT_MAX_BATCH_SIZE,
        )
        .unwrap();

        assert_eq!(tasks[0].key(), "7");
        assert_eq!(tasks[0].title, "Write");
        assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(tasks[0].importance, 8);
        assert_eq!(tasks[0].dependencies, vec!["3", "Read"]);
        assert_eq!(tasks[1].key(), "Read");
        assert_eq!(tasks[1].importance, 5);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = validate_batch(
            inputs(json!([{"id": "a", "title": "A"}, {"id": "a", "title": "B"}])),
            DEFAULT_MAX_BATCH_SIZE,
        )
        .unwrap_err();
        let CoreError::Validation(errors) = err else { panic!("expected validation error") };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index, 1);
        assert!(errors[0].message.contains("duplicate"));
    }

    #[test]
    fn enforces_batch_limit() {
        let err = validate_batch(inputs(json!([{"title": "A"}, {"title": "B"}])), 1).unwrap_err();
        assert!(matches!(err, CoreError::BatchTooLarge { size: 2, limit: 1 }));
    }

    #[test]
    fn resolves_titles_to_keys() {
        let mut tasks = vec![
            Task::new("Design").with_id("d1"),
            Task::new("Build").with_id("b1").with_dependencies(["Design", "d1", "Nowhere"]),
        ];
        resolve_dependencies(&mut tasks);
        assert_eq!(tasks[1].dependencies, vec!["d1", "d1", "Nowhere"]);
    }

    #[test]
    fn analyze_rejects_cycles() {
        let tasks = vec![
            Task::new("One").with_id("1").with_dependencies(["Two"]),
            Task::new("Two").with_id("2").with_dependencies(["1"]),
        ];
        let err = analyze(tasks, &AnalyzeOptions::default(), today()).unwrap_err();
        let CoreError::CircularDependencies(cycles) = err else { panic!("expected cycles") };
        assert_eq!(cycles, vec![vec!["1".to_string(), "2".into()]]);
    }

    #[test]
    fn analyze_returns_ranking_and_graph() {
        let tasks = vec![
            Task::new("A").with_id("A").with_hours(5.0),
            Task::new("B").with_id("B").with_hours(2.0).with_dependencies(["A", "ghost"]),
        ];
        let analysis = analyze(tasks, &AnalyzeOptions::default(), today()).unwrap();
        assert_eq!(analysis.tasks[0].id(), "A");
        assert!(analysis.cycles.is_empty());
        assert_eq!(analysis.graph.nodes.len(), 2);
        assert_eq!(analysis.graph.edges.len(), 1);
        // Unresolved references survive on the record itself.
        let b = analysis.tasks.iter().find(|t| t.id() == "B").unwrap();
        assert_eq!(b.task.dependencies, vec!["A", "ghost"]);
    }

    #[test]
    fn suggest_honours_limit() {
        let tasks: Vec<Task> = (1..=6).map(|i| Task::new(format!("t{i}"))).collect();
        let options = AnalyzeOptions {
            suggestion_limit: 2,
            ..Default::default()
        };
        let picks = suggest(tasks, &options, today()).unwrap();
        assert_eq!(picks.len(), 2);
    }
}
