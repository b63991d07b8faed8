use priora_core::{Analysis, ScoredTask, Suggestion};

fn due_label(t: &ScoredTask) -> String {
    match (t.task.due_date, t.days_until_due) {
        (Some(d), Some(n)) if n < 0 => format!("{d} ({} days overdue)", -n),
        (Some(d), Some(n)) => format!("{d} (in {n} days)"),
        _ => "no due date".to_string(),
    }
}

fn task_line(rank: usize, t: &ScoredTask) -> String {
    format!(
        "{rank:>2}. [{:>6.2}] {} ({}) | importance={} | est={}h | due {}",
        t.score,
        t.task.title,
        t.id(),
        t.task.importance,
        t.task.estimated_hours,
        due_label(t)
    )
}

pub fn analysis_text(a: &Analysis) -> String {
    let mut s = String::new();
    s.push_str(&format!("# Ranked tasks ({})\n\n", a.tasks.len()));
    for (i, t) in a.tasks.iter().enumerate() {
        s.push_str(&task_line(i + 1, t));
        s.push('\n');
        s.push_str(&format!("      {}\n", t.explanation));
    }
    s.push_str(&format!(
        "\nGraph: {} nodes, {} edges\n",
        a.graph.nodes.len(),
        a.graph.edges.len()
    ));
    s
}

pub fn suggestions_text(picks: &[Suggestion]) -> String {
    if picks.is_empty() {
        return "No tasks to suggest.\n".to_string();
    }
    let mut s = String::from("# Suggested next\n\n");
    for (i, p) in picks.iter().enumerate() {
        s.push_str(&task_line(i + 1, &p.task));
        s.push('\n');
        let why: Vec<&str> = p.why.iter().map(|r| r.label()).collect();
        s.push_str(&format!("      why: {}\n", why.join(", ")));
    }
    s
}

pub fn cycles_text(cycles: &[Vec<String>]) -> String {
    if cycles.is_empty() {
        return "acyclic\n".to_string();
    }
    let mut s = format!("{} cycle(s) found\n", cycles.len());
    for c in cycles {
        let mut path = c.clone();
        if let Some(first) = c.first() {
            path.push(first.clone());
        }
        s.push_str(&format!("- {}\n", path.join(" -> ")));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_are_closed_in_output() {
        let out = cycles_text(&[vec!["1".into(), "2".into(), "3".into()]]);
        assert!(out.contains("1 cycle(s) found"));
        assert!(out.contains("- 1 -> 2 -> 3 -> 1"));
        assert_eq!(cycles_text(&[]), "acyclic\n");
    }
}
