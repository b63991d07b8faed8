//! Property tests for the scoring, calendar and cycle invariants.

use chrono::{Duration, NaiveDate};
use priora_core::scoring::{effort_norm, urgency_norm};
use priora_core::{compute_scores_on, detect_cycles, HolidayCalendar, Strategy, Task};
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

proptest! {
    #[test]
    fn business_days_are_antisymmetric(a in 0i64..1500, b in 0i64..1500) {
        let cal = HolidayCalendar::default();
        let x = base() + Duration::days(a);
        let y = base() + Duration::days(b);
        prop_assert_eq!(
            cal.business_days_between(x, y),
            -cal.business_days_between(y, x)
        );
    }

    #[test]
    fn business_days_never_exceed_calendar_days(a in 0i64..1500, len in 0i64..400) {
        let cal = HolidayCalendar::default();
        let x = base() + Duration::days(a);
        let n = cal.business_days_between(x, x + Duration::days(len));
        prop_assert!(n >= 0 && n <= len);
    }

    #[test]
    fn business_days_match_a_day_by_day_count(a in 0i64..3000, len in 0i64..1200, extra in 0i64..1500) {
        let cal = HolidayCalendar::default().with_date(base() + Duration::days(extra));
        let x = base() + Duration::days(a);
        let y = x + Duration::days(len);
        let walked = x
            .iter_days()
            .take_while(|&d| d < y)
            .filter(|&d| cal.is_business_day(d))
            .count() as i64;
        prop_assert_eq!(cal.business_days_between(x, y), walked);
    }

    #[test]
    fn effort_strictly_decreases_within_unit_interval(h in 0.0f64..10_000.0, dh in 0.01f64..100.0) {
        let lo = effort_norm(h);
        let hi = effort_norm(h + dh);
        prop_assert!(hi < lo);
        prop_assert!(lo > 0.0 && lo <= 1.0);
        prop_assert!(hi > 0.0 && hi <= 1.0);
    }

    #[test]
    fn urgency_stays_within_zero_and_three(bd in -10_000i64..10_000) {
        let u = urgency_norm(Some(bd));
        prop_assert!((0.0..=3.0).contains(&u));
    }

    #[test]
    fn sooner_due_date_never_scores_lower(
        a in -60i64..120,
        gap in 1i64..90,
        hours in 0.0f64..40.0,
        importance in 1u8..=10,
    ) {
        let today = base() + Duration::days(10);
        let sooner = Task::new("A").with_id("A")
            .with_due_date(today + Duration::days(a))
            .with_hours(hours)
            .with_importance(importance);
        let later = Task::new("B").with_id("B")
            .with_due_date(today + Duration::days(a + gap))
            .with_hours(hours)
            .with_importance(importance);

        let scored = compute_scores_on(&[sooner, later], None, Strategy::Smart, today);
        let a = scored.iter().find(|s| s.id() == "A").unwrap();
        let b = scored.iter().find(|s| s.id() == "B").unwrap();
        prop_assert!(a.factors.urgency_norm >= b.factors.urgency_norm);
        prop_assert!(a.raw_score >= b.raw_score);
    }

    #[test]
    fn dependents_raise_dependency_factor(extra in 0usize..6) {
        let mut tasks = vec![
            Task::new("blocker").with_id("blocker"),
            Task::new("loner").with_id("loner"),
            Task::new("waiter").with_id("waiter").with_dependencies(["blocker"]),
        ];
        for i in 0..extra {
            tasks.push(Task::new(format!("filler{i}")));
        }
        let scored = compute_scores_on(&tasks, None, Strategy::Smart, base());
        let blocker = scored.iter().find(|s| s.id() == "blocker").unwrap();
        let loner = scored.iter().find(|s| s.id() == "loner").unwrap();
        prop_assert!(blocker.factors.dependency_norm > loner.factors.dependency_norm);
    }

    #[test]
    fn fastest_never_demotes_the_quick_task(
        big_hours in 20.0f64..400.0,
        importance in 6u8..=10,
        due_in in 0i64..5,
    ) {
        let today = base() + Duration::days(40);
        let tasks = vec![
            Task::new("big").with_id("big")
                .with_hours(big_hours)
                .with_importance(importance)
                .with_due_date(today + Duration::days(due_in)),
            Task::new("quick").with_id("quick").with_hours(0.1),
        ];
        let rank = |strategy: Strategy| {
            compute_scores_on(&tasks, None, strategy, today)
                .iter()
                .position(|s| s.id() == "quick")
                .unwrap()
        };
        prop_assert!(rank(Strategy::Fastest) <= rank(Strategy::Smart));

        let gap = |strategy: Strategy| {
            let scored = compute_scores_on(&tasks, None, strategy, today);
            let score_of = |id: &str| scored.iter().find(|s| s.id() == id).unwrap().raw_score;
            score_of("quick") - score_of("big")
        };
        prop_assert!(gap(Strategy::Fastest) > gap(Strategy::Smart));
    }

    #[test]
    fn forward_only_edges_are_acyclic(n in 1usize..40, seed in any::<u64>()) {
        // Task i may only depend on tasks j > i.
        let tasks: Vec<Task> = (0..n)
            .map(|i| {
                let deps: Vec<String> = ((i + 1)..n)
                    .filter(|j| (seed >> ((i * 7 + j) % 64)) & 1 == 1)
                    .map(|j| j.to_string())
                    .collect();
                Task::new(format!("t{i}")).with_id(i.to_string()).with_dependencies(deps)
            })
            .collect();
        prop_assert!(detect_cycles(&tasks).is_empty());
    }

    #[test]
    fn ring_is_reported_with_every_member(n in 1usize..30) {
        let tasks: Vec<Task> = (0..n)
            .map(|i| {
                Task::new(format!("t{i}"))
                    .with_id(i.to_string())
                    .with_dependencies([((i + 1) % n).to_string()])
            })
            .collect();
        let cycles = detect_cycles(&tasks);
        prop_assert_eq!(cycles.len(), 1);
        prop_assert_eq!(cycles[0].len(), n);
        for i in 0..n {
            let id = i.to_string();
            prop_assert!(cycles[0].contains(&id));
        }
    }
}
