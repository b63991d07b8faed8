//! Top-N suggestions with short reasons attached.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::scoring::ScoredTask;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;

/// Factor value above which a factor counts as a reason.
const REASON_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    Urgent,
    HighImportance,
    QuickWin,
    HasDependencies,
    BlockingOthers,
    Balanced,
}

impl Reason {
    pub fn label(self) -> &'static str {
        match self {
            Reason::Urgent => "urgent",
            Reason::HighImportance => "high importance",
            Reason::QuickWin => "quick win",
            Reason::HasDependencies => "has dependencies",
            Reason::BlockingOthers => "blocking other tasks",
            Reason::Balanced => "balanced priority",
        }
    }

    /// Reasons for one scored task, never empty.
    pub fn for_task(task: &ScoredTask) -> Vec<Reason> {
        let f = &task.factors;
        let mut why = Vec::new();
        if f.urgency_norm > REASON_THRESHOLD {
            why.push(Reason::Urgent);
        }
        if f.importance_norm > REASON_THRESHOLD {
            why.push(Reason::HighImportance);
        }
        if f.effort_norm > REASON_THRESHOLD {
            why.push(Reason::QuickWin);
        }
        if !task.task.dependencies.is_empty() {
            why.push(Reason::HasDependencies);
        }
        if task.depended_by > 0 {
            why.push(Reason::BlockingOthers);
        }
        if why.is_empty() {
            why.push(Reason::Balanced);
        }
        why
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub task: ScoredTask,
    pub why: Vec<Reason>,
}

/// Take the first `limit` entries of an already ranked list.
pub fn select_suggestions(ranked: &[ScoredTask], limit: usize) -> Vec<Suggestion> {
    ranked
        .iter()
        .take(limit)
        .map(|s| Suggestion {
            why: Reason::for_task(s),
            task: s.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{compute_scores_on, Strategy};
    use crate::task::Task;
    use chrono::{Duration, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[test]
    fn takes_top_three_by_default_limit() {
        let tasks: Vec<Task> = (1..=5)
            .map(|i| Task::new(format!("t{i}")).with_importance(i))
            .collect();
        let ranked = compute_scores_on(&tasks, None, Strategy::Smart, today());
        let picks = select_suggestions(&ranked, DEFAULT_SUGGESTION_LIMIT);
        assert_eq!(picks.len(), 3);
        assert_eq!(picks[0].task.id(), "t5");
        assert_eq!(picks[2].task.id(), "t3");
    }

    #[test]
    fn short_batches_return_everything() {
        let ranked = compute_scores_on(&[Task::new("only")], None, Strategy::Smart, today());
        assert_eq!(select_suggestions(&ranked, 3).len(), 1);
        assert!(select_suggestions(&[], 3).is_empty());
    }

    #[test]
    fn reasons_follow_factors() {
        let tasks = vec![
            Task::new("Ship")
                .with_id("ship")
                .with_importance(9)
                .with_due_date(today() + Duration::days(1))
                .with_hours(8.0)
                .with_dependencies(["fix"]),
            Task::new("Fix").with_id("fix").with_hours(8.0),
        ];
        let ranked = compute_scores_on(&tasks, None, Strategy::Smart, today());
        let picks = select_suggestions(&ranked, 3);

        let ship = picks.iter().find(|p| p.task.id() == "ship").unwrap();
        assert_eq!(
            ship.why,
            vec![Reason::Urgent, Reason::HighImportance, Reason::HasDependencies]
        );

        let fix = picks.iter().find(|p| p.task.id() == "fix").unwrap();
        assert_eq!(fix.why, vec![Reason::BlockingOthers]);
    }

    #[test]
    fn falls_back_to_balanced() {
        let ranked = compute_scores_on(
            &[Task::new("Meh").with_hours(6.0)],
            None,
            Strategy::Smart,
            today(),
        );
        let picks = select_suggestions(&ranked, 3);
        assert_eq!(picks[0].why, vec![Reason::Balanced]);
        assert_eq!(
            serde_json::to_value(&picks[0].why).unwrap(),
            serde_json::json!(["balanced priority"])
        );
    }

    #[test]
    fn zero_hour_task_is_not_a_quick_win() {
        // effort_norm(0) is about 0.59, just under the threshold.
        let ranked = compute_scores_on(&[Task::new("Nothing")], None, Strategy::Smart, today());
        assert!(!Reason::for_task(&ranked[0]).contains(&Reason::QuickWin));
    }
}
