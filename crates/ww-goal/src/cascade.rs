// cascade.rs — Completion toggles and the writes they fan out to.
//
// Toggling one instance can affect other weeks:
//
//   Weekly / one-off         → only the toggled instance changes
//   Monthly                  → every instance of the template whose week falls
//                              in the same month (Monday-based) gets the same value
//   Deadline → completed     → the toggled instance is completed and every later
//                              instance of the template is removed
//   Deadline → not completed → only the toggled instance changes; pruned
//                              weeks are not restored
//
// `toggle` is a pure transform over the weeks the caller has in memory. It
// returns a `CascadePlan`: the full replacement goal list for every touched
// week, in chronological order, which the caller writes one by one.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ww_calendar::{MonthId, WeekId};

use crate::error::GoalError;
use crate::instance::{GoalInstance, GoalKind};

/// In-memory goals, keyed by week.
pub type WeekGoals = BTreeMap<WeekId, Vec<GoalInstance>>;

/// Which branch of the state machine a toggle took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cascade", rename_all = "snake_case")]
pub enum CascadeKind {
    Single,
    Monthly { month: MonthId },
    DeadlinePrune,
}

/// Every write one toggle needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadePlan {
    pub goal_id: String,
    pub week: WeekId,
    pub kind: CascadeKind,
    pub new_completed: bool,
    /// Full replacement goal list per touched week, ordered by week.
    pub writes: BTreeMap<WeekId, Vec<GoalInstance>>,
    /// Weeks whose write removes instances (deadline pruning).
    pub deletes: BTreeSet<WeekId>,
    /// Ids of the removed instances.
    pub pruned_ids: Vec<String>,
}

impl CascadePlan {
    fn new(goal_id: &str, week: WeekId, kind: CascadeKind, new_completed: bool) -> Self {
        Self {
            goal_id: goal_id.to_string(),
            week,
            kind,
            new_completed,
            writes: BTreeMap::new(),
            deletes: BTreeSet::new(),
            pruned_ids: Vec::new(),
        }
    }

    pub fn touched_weeks(&self) -> Vec<WeekId> {
        self.writes.keys().copied().collect()
    }

    /// Apply the plan's writes to an in-memory model.
    pub fn apply_to(&self, weeks: &mut WeekGoals) {
        for (week, goals) in &self.writes {
            weeks.insert(*week, goals.clone());
        }
    }
}

/// Compute the cascade for toggling `goal_id` in `week`.
pub fn toggle(
    goal_id: &str,
    week: WeekId,
    weeks: &WeekGoals,
    now: DateTime<Utc>,
) -> Result<CascadePlan, GoalError> {
    let target = weeks
        .get(&week)
        .and_then(|goals| goals.iter().find(|g| g.id == goal_id))
        .ok_or_else(|| GoalError::GoalNotFound {
            goal_id: goal_id.to_string(),
            week,
        })?;
    let new_completed = !target.completed;

    let plan = match &target.kind {
        GoalKind::Weekly { .. } | GoalKind::OneOff => single(goal_id, week, weeks, new_completed, now),
        GoalKind::Monthly { template_id } => {
            monthly(goal_id, week, template_id, weeks, new_completed, now)
        }
        GoalKind::Deadline { template_id, .. } if new_completed => {
            deadline_complete(goal_id, week, template_id, weeks, now)
        }
        GoalKind::Deadline { .. } => single(goal_id, week, weeks, new_completed, now),
    };

    tracing::debug!(
        "toggle {} in {}: {:?}, {} write(s), {} pruned",
        goal_id,
        week,
        plan.kind,
        plan.writes.len(),
        plan.pruned_ids.len()
    );
    Ok(plan)
}

fn single(
    goal_id: &str,
    week: WeekId,
    weeks: &WeekGoals,
    completed: bool,
    now: DateTime<Utc>,
) -> CascadePlan {
    let mut plan = CascadePlan::new(goal_id, week, CascadeKind::Single, completed);
    let mut goals = weeks.get(&week).cloned().unwrap_or_default();
    for goal in goals.iter_mut().filter(|g| g.id == goal_id) {
        goal.set_completed(completed, now);
    }
    plan.writes.insert(week, goals);
    plan
}

fn monthly(
    goal_id: &str,
    week: WeekId,
    template_id: &str,
    weeks: &WeekGoals,
    completed: bool,
    now: DateTime<Utc>,
) -> CascadePlan {
    let month = week.month_id();
    let mut plan = CascadePlan::new(goal_id, week, CascadeKind::Monthly { month }, completed);

    for (w, goals) in weeks.iter().filter(|(w, _)| w.month_id() == month) {
        if !goals.iter().any(|g| g.template_id() == Some(template_id)) {
            continue;
        }
        let mut goals = goals.clone();
        for goal in goals
            .iter_mut()
            .filter(|g| g.template_id() == Some(template_id))
        {
            goal.set_completed(completed, now);
        }
        plan.writes.insert(*w, goals);
    }
    plan
}

fn deadline_complete(
    goal_id: &str,
    week: WeekId,
    template_id: &str,
    weeks: &WeekGoals,
    now: DateTime<Utc>,
) -> CascadePlan {
    let mut plan = single(goal_id, week, weeks, true, now);
    plan.kind = CascadeKind::DeadlinePrune;

    for (w, goals) in weeks.range((Bound::Excluded(week), Bound::Unbounded)) {
        let (pruned, kept): (Vec<GoalInstance>, Vec<GoalInstance>) = goals
            .iter()
            .cloned()
            .partition(|g| g.template_id() == Some(template_id));
        if pruned.is_empty() {
            continue;
        }
        plan.pruned_ids.extend(pruned.into_iter().map(|g| g.id));
        plan.deletes.insert(*w);
        plan.writes.insert(*w, kept);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn week(s: &str) -> WeekId {
        s.parse().unwrap()
    }

    fn goal(id: &str, w: &str, kind: GoalKind) -> GoalInstance {
        GoalInstance {
            id: id.to_string(),
            week: week(w),
            title: id.to_string(),
            description: String::new(),
            dream: None,
            kind,
            completed: false,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    fn monthly_kind() -> GoalKind {
        GoalKind::Monthly {
            template_id: "m".to_string(),
        }
    }

    fn deadline_kind() -> GoalKind {
        GoalKind::Deadline {
            template_id: "d".to_string(),
            target_date: NaiveDate::from_ymd_opt(2025, 3, 31),
        }
    }

    fn model(goals: Vec<GoalInstance>) -> WeekGoals {
        let mut weeks = WeekGoals::new();
        for g in goals {
            weeks.entry(g.week).or_default().push(g);
        }
        weeks
    }

    #[test]
    fn unknown_goal_is_not_found() {
        let weeks = model(vec![goal("a", "2025-W10", GoalKind::OneOff)]);
        assert!(matches!(
            toggle("zzz", week("2025-W10"), &weeks, Utc::now()),
            Err(GoalError::GoalNotFound { .. })
        ));
        assert!(matches!(
            toggle("a", week("2025-W11"), &weeks, Utc::now()),
            Err(GoalError::GoalNotFound { .. })
        ));
    }

    #[test]
    fn weekly_toggle_touches_one_week_and_flips_back() {
        let weekly = GoalKind::Weekly {
            template_id: "w".to_string(),
        };
        let mut weeks = model(vec![
            goal("w_2025-W10", "2025-W10", weekly.clone()),
            goal("w_2025-W11", "2025-W11", weekly),
        ]);
        let now = Utc::now();
        let plan = toggle("w_2025-W10", week("2025-W10"), &weeks, now).unwrap();
        assert_eq!(plan.kind, CascadeKind::Single);
        assert!(plan.new_completed);
        assert_eq!(plan.touched_weeks(), vec![week("2025-W10")]);
        assert_eq!(plan.writes[&week("2025-W10")][0].completed_at, Some(now));

        plan.apply_to(&mut weeks);
        let back = toggle("w_2025-W10", week("2025-W10"), &weeks, now).unwrap();
        assert!(!back.new_completed);
        assert!(back.writes[&week("2025-W10")][0].completed_at.is_none());
    }

    #[test]
    fn single_toggle_leaves_other_goals_in_the_week_alone() {
        let weeks = model(vec![
            goal("a", "2025-W10", GoalKind::OneOff),
            goal("b", "2025-W10", GoalKind::OneOff),
        ]);
        let plan = toggle("a", week("2025-W10"), &weeks, Utc::now()).unwrap();
        let written = &plan.writes[&week("2025-W10")];
        assert!(written[0].completed);
        assert!(!written[1].completed);
    }

    #[test]
    fn monthly_toggle_covers_the_whole_month_only() {
        // March 2025 Mondays: W10..W14. W15 starts 2025-04-07.
        let weeks = model(
            (10..=15)
                .map(|n| {
                    let w = format!("2025-W{:02}", n);
                    goal(&format!("m_{}", w), &w, monthly_kind())
                })
                .chain(std::iter::once(goal("other", "2025-W11", GoalKind::OneOff)))
                .collect(),
        );
        let plan = toggle("m_2025-W10", week("2025-W10"), &weeks, Utc::now()).unwrap();
        assert_eq!(
            plan.kind,
            CascadeKind::Monthly {
                month: "2025-03".parse().unwrap()
            }
        );
        let touched: Vec<String> = plan.touched_weeks().iter().map(|w| w.to_string()).collect();
        assert_eq!(
            touched,
            vec!["2025-W10", "2025-W11", "2025-W12", "2025-W13", "2025-W14"]
        );
        for goals in plan.writes.values() {
            for g in goals {
                assert_eq!(g.completed, g.template_id() == Some("m"));
            }
        }
    }

    #[test]
    fn monthly_uncomplete_also_cascades() {
        let mut weeks = model(vec![
            goal("m_2025-W10", "2025-W10", monthly_kind()),
            goal("m_2025-W11", "2025-W11", monthly_kind()),
        ]);
        toggle("m_2025-W10", week("2025-W10"), &weeks, Utc::now())
            .unwrap()
            .apply_to(&mut weeks);
        let plan = toggle("m_2025-W11", week("2025-W11"), &weeks, Utc::now()).unwrap();
        assert!(!plan.new_completed);
        assert_eq!(plan.writes.len(), 2);
        assert!(plan.writes.values().flatten().all(|g| !g.completed));
    }

    #[test]
    fn deadline_completion_prunes_later_weeks() {
        let weeks = model(vec![
            goal("d_2025-W10", "2025-W10", deadline_kind()),
            goal("d_2025-W11", "2025-W11", deadline_kind()),
            goal("d_2025-W12", "2025-W12", deadline_kind()),
            goal("d_2025-W13", "2025-W13", deadline_kind()),
            goal("keep", "2025-W12", GoalKind::OneOff),
        ]);
        let plan = toggle("d_2025-W11", week("2025-W11"), &weeks, Utc::now()).unwrap();
        assert_eq!(plan.kind, CascadeKind::DeadlinePrune);
        assert_eq!(plan.pruned_ids, vec!["d_2025-W12", "d_2025-W13"]);
        assert_eq!(
            plan.deletes,
            [week("2025-W12"), week("2025-W13")].into_iter().collect()
        );
        assert!(!plan.writes.contains_key(&week("2025-W10")));
        assert!(plan.writes[&week("2025-W11")][0].completed);
        assert_eq!(plan.writes[&week("2025-W12")].len(), 1);
        assert_eq!(plan.writes[&week("2025-W12")][0].id, "keep");
        assert!(plan.writes[&week("2025-W13")].is_empty());
    }

    #[test]
    fn deadline_uncomplete_does_not_resurrect() {
        let mut weeks = model(vec![
            goal("d_2025-W10", "2025-W10", deadline_kind()),
            goal("d_2025-W11", "2025-W11", deadline_kind()),
        ]);
        toggle("d_2025-W10", week("2025-W10"), &weeks, Utc::now())
            .unwrap()
            .apply_to(&mut weeks);
        assert!(weeks[&week("2025-W11")].is_empty());

        let plan = toggle("d_2025-W10", week("2025-W10"), &weeks, Utc::now()).unwrap();
        assert_eq!(plan.kind, CascadeKind::Single);
        assert_eq!(plan.touched_weeks(), vec![week("2025-W10")]);
        assert!(plan.deletes.is_empty());
    }
}
