// scenarios.rs — End-to-end goal scenarios and engine-wide properties.
//
// Each test drives a GoalSession over the in-memory store, so the full path
// (materialize → cascade → sequential writes → cache invalidation) is covered.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use ww_calendar::{iso_week, MonthId, WeekId};
use ww_goal::{
    is_active, load_or_create, CascadeKind, GoalKind, GoalSession, GoalTemplate, MemoryWeekStore,
    NoMilestones, Recurrence, SeriesRequest, WeekStore,
};

fn week(s: &str) -> WeekId {
    s.parse().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session() -> GoalSession<MemoryWeekStore, NoMilestones> {
    GoalSession::new(MemoryWeekStore::new(), NoMilestones, "alice")
}

/// Stored goals of `template_id` across every week of the user's documents.
fn stored_by_week(
    session: &GoalSession<MemoryWeekStore, NoMilestones>,
    template_id: &str,
) -> BTreeMap<WeekId, (String, bool)> {
    let store = session.store();
    let mut found = BTreeMap::new();
    for year in store.document_years("alice").unwrap() {
        let doc = store.week_document("alice", year).unwrap();
        for (w, entry) in doc.weeks {
            for g in entry.goals {
                if g.template_id() == Some(template_id) {
                    found.insert(w, (g.id.clone(), g.completed));
                }
            }
        }
    }
    found
}

fn series_template_id(goals: &[ww_goal::GoalInstance]) -> String {
    goals[0].template_id().unwrap().to_string()
}

#[test]
fn scenario_a_weekly_template_for_three_weeks() {
    // Monday of 2025-W02 is 2025-01-06.
    let template = GoalTemplate::new("Swim", Recurrence::Weekly, date(2025, 1, 6)).for_weeks(3);
    for w in ["2025-W02", "2025-W03", "2025-W04"] {
        assert!(is_active(&template, week(w), None), "{w} should be active");
    }
    assert!(!is_active(&template, week("2025-W05"), None));

    let mut s = session();
    let t = s.create_weekly_template(template).unwrap();
    for (w, expected) in [
        ("2025-W01", 0),
        ("2025-W02", 1),
        ("2025-W04", 1),
        ("2025-W05", 0),
    ] {
        let goals = s.load_week_goals_if_needed(week(w)).unwrap();
        assert_eq!(goals.len(), expected, "goals in {w}");
        if expected == 1 {
            assert_eq!(goals[0].id, format!("{}_{}", t.id, w));
        }
    }
}

#[test]
fn scenario_b_monthly_goal_completes_the_whole_month() {
    let mut s = session();
    let goals = s
        .create_monthly_or_deadline_instances(SeriesRequest::monthly("Budget", 2, week("2025-W10")))
        .unwrap();
    assert_eq!(goals.len(), 8);
    assert_eq!(goals[0].week, week("2025-W10"));
    assert_eq!(goals[7].week, week("2025-W17"));
    assert!(goals.iter().all(|g| matches!(g.kind, GoalKind::Monthly { .. })));

    let template_id = series_template_id(&goals);
    let outcome = s
        .toggle_goal_completion(&goals[0].id, week("2025-W10"))
        .unwrap();
    let march: MonthId = "2025-03".parse().unwrap();
    assert_eq!(outcome.cascade, CascadeKind::Monthly { month: march });
    assert!(outcome.completed);

    for (w, (_, completed)) in stored_by_week(&s, &template_id) {
        assert_eq!(
            completed,
            w.month_id() == march,
            "{w} completion should follow its month"
        );
    }
    // W10..W14 have March Mondays.
    assert_eq!(outcome.weeks_written.len(), 5);
}

#[test]
fn scenario_c_deadline_completion_prunes_future_weeks() {
    let mut s = session();
    // Created Monday 2025-03-03 (W10), due four weeks later.
    let goals = s
        .create_monthly_or_deadline_instances(SeriesRequest::deadline(
            "Submit thesis",
            date(2025, 3, 31),
            date(2025, 3, 3),
        ))
        .unwrap();
    let weeks: Vec<String> = goals.iter().map(|g| g.week.to_string()).collect();
    assert_eq!(weeks, vec!["2025-W10", "2025-W11", "2025-W12", "2025-W13"]);
    let template_id = series_template_id(&goals);

    let w11 = goals[1].id.clone();
    let outcome = s.toggle_goal_completion(&w11, week("2025-W11")).unwrap();
    assert_eq!(outcome.cascade, CascadeKind::DeadlinePrune);
    assert_eq!(outcome.pruned_ids.len(), 2);

    let remaining = stored_by_week(&s, &template_id);
    let remaining_weeks: Vec<WeekId> = remaining.keys().copied().collect();
    assert_eq!(remaining_weeks, vec![week("2025-W10"), week("2025-W11")]);
    assert!(!remaining[&week("2025-W10")].1);
    assert!(remaining[&week("2025-W11")].1);

    // Un-completing does not bring the pruned weeks back.
    s.toggle_goal_completion(&w11, week("2025-W11")).unwrap();
    let after = stored_by_week(&s, &template_id);
    assert_eq!(after.len(), 2);
    assert!(!after[&week("2025-W11")].1);
}

#[test]
fn materialization_is_idempotent() {
    let store = MemoryWeekStore::new();
    let templates = vec![
        GoalTemplate::new("A", Recurrence::Weekly, date(2025, 1, 1)),
        GoalTemplate::new("B", Recurrence::Monthly, date(2025, 2, 1)).for_weeks(8),
        GoalTemplate::new("C", Recurrence::Weekly, date(2025, 6, 1)),
    ];
    for w in ["2024-W50", "2025-W01", "2025-W06", "2025-W13", "2025-W30"] {
        let first: BTreeSet<String> = load_or_create(&store, &NoMilestones, "u", week(w), &templates)
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        let second: BTreeSet<String> = load_or_create(&store, &NoMilestones, "u", week(w), &templates)
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(first, second, "ids differ for {w}");
    }
}

#[test]
fn weeks_duration_boundary_holds_across_years() {
    // Mondays: 2025-W02, 2020-W50 (crosses the 53-week 2020), 2025-W51.
    for start in [date(2025, 1, 6), date(2020, 12, 7), date(2025, 12, 15)] {
        let s = iso_week(start);
        for n in 1..=8u32 {
            let t = GoalTemplate::new("t", Recurrence::Weekly, start).for_weeks(n);
            for k in 0..i64::from(n) {
                assert!(is_active(&t, s.offset(k), None), "start {s}, n {n}, k {k}");
            }
            assert!(!is_active(&t, s.offset(i64::from(n)), None), "start {s}, n {n}");
            assert!(!is_active(&t, s.offset(-1), None));
        }
    }
}

#[test]
fn monthly_groups_are_uniform_after_every_toggle() {
    let mut s = session();
    // 3 months from 2025-W05 spans Jan/Feb/Mar/Apr Mondays.
    let goals = s
        .create_monthly_or_deadline_instances(SeriesRequest::monthly("Save", 3, week("2025-W05")))
        .unwrap();
    let template_id = series_template_id(&goals);

    for g in &goals {
        s.toggle_goal_completion(&g.id, g.week).unwrap();
        let mut by_month: BTreeMap<MonthId, BTreeSet<bool>> = BTreeMap::new();
        for (w, (_, completed)) in stored_by_week(&s, &template_id) {
            by_month.entry(w.month_id()).or_default().insert(completed);
        }
        for (month, values) in by_month {
            assert_eq!(values.len(), 1, "month {month} is mixed after toggling {}", g.id);
        }
    }
}

#[test]
fn monthly_group_spanning_iso_years() {
    // 2026-W01 starts Monday 2025-12-29, so it belongs to December 2025.
    let mut s = session();
    let goals = s
        .create_monthly_or_deadline_instances(SeriesRequest::monthly("Review", 1, week("2025-W50")))
        .unwrap();
    let weeks: Vec<String> = goals.iter().map(|g| g.week.to_string()).collect();
    assert_eq!(weeks, vec!["2025-W50", "2025-W51", "2025-W52", "2026-W01"]);
    let template_id = series_template_id(&goals);

    s.toggle_goal_completion(&goals[3].id, week("2026-W01")).unwrap();
    assert!(stored_by_week(&s, &template_id).values().all(|(_, c)| *c));
}

#[test]
fn deadline_pruning_leaves_earlier_weeks_untouched() {
    let mut s = session();
    let goals = s
        .create_monthly_or_deadline_instances(SeriesRequest::deadline(
            "Launch",
            date(2025, 6, 30),
            date(2025, 5, 5),
        ))
        .unwrap();
    let template_id = series_template_id(&goals);
    let before = stored_by_week(&s, &template_id);
    let completed_at = goals[3].week;

    s.toggle_goal_completion(&goals[3].id, completed_at).unwrap();
    let after = stored_by_week(&s, &template_id);

    assert!(after.keys().all(|w| *w <= completed_at));
    for (w, state) in &after {
        if *w < completed_at {
            assert_eq!(state, &before[w]);
        }
    }
    assert!(after[&completed_at].1);
}

#[test]
fn eager_batch_keeps_lazy_goals_in_unvisited_weeks() {
    let mut s = session();
    s.create_weekly_template(GoalTemplate::new("Walk", Recurrence::Weekly, date(2025, 1, 6)))
        .unwrap();
    s.create_monthly_or_deadline_instances(SeriesRequest::monthly("Budget", 1, week("2025-W20")))
        .unwrap();

    let goals = s.load_week_goals_if_needed(week("2025-W21")).unwrap();
    let kinds: Vec<&str> = goals.iter().map(|g| g.kind.label()).collect();
    assert_eq!(kinds, vec!["weekly", "monthly"]);
}
