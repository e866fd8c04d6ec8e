// activation.rs — Decides whether a template produces an instance for a week.
//
// Rules are evaluated in order and the first match wins:
//
// 1. Template disabled by its author? → Inactive
// 2. Week before the template's start week? → Inactive
// 3. Unlimited duration? → Active
// 4. Weeks duration? → Active while fewer than `duration_weeks` weeks have elapsed
// 5. Milestone duration? → Active unless the linked milestone is completed
// 6. Anything else (malformed configuration) → Active
//
// Rule 6 is permissive: a `weeks` template without `duration_weeks`, or a
// `milestone` template without a milestone id, keeps producing goals. The
// decision carries `ActiveReason::PermissiveDefault` so callers can log it.
//
// Evaluation is pure. The milestone, when needed, is looked up by the caller.

use serde::{Deserialize, Serialize};
use ww_calendar::{weeks_between, WeekId};

use crate::template::{DurationType, GoalTemplate, Milestone};

/// Why a template is active for a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveReason {
    Unlimited,
    WithinWeeks { elapsed: i64, limit: u32 },
    MilestoneOpen,
    PermissiveDefault,
}

/// Why a template is not active for a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactiveReason {
    Disabled,
    BeforeStart,
    WeeksElapsed { elapsed: i64, limit: u32 },
    MilestoneCompleted,
}

/// Outcome of evaluating one template against one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "activation", content = "reason", rename_all = "snake_case")]
pub enum Activation {
    Active(ActiveReason),
    Inactive(InactiveReason),
}

impl Activation {
    pub fn is_active(&self) -> bool {
        matches!(self, Activation::Active(_))
    }
}

/// Evaluate `template` for `week`, reporting the rule that decided it.
pub fn evaluate(template: &GoalTemplate, week: WeekId, milestone: Option<&Milestone>) -> Activation {
    if !template.active {
        return Activation::Inactive(InactiveReason::Disabled);
    }

    let start_week = template.start_week();
    if week < start_week {
        return Activation::Inactive(InactiveReason::BeforeStart);
    }

    match (template.duration_type, template.duration_weeks) {
        (DurationType::Unlimited, _) => Activation::Active(ActiveReason::Unlimited),
        (DurationType::Weeks, Some(limit)) => {
            let elapsed = weeks_between(start_week, week);
            if elapsed < i64::from(limit) {
                Activation::Active(ActiveReason::WithinWeeks { elapsed, limit })
            } else {
                Activation::Inactive(InactiveReason::WeeksElapsed { elapsed, limit })
            }
        }
        (DurationType::Milestone, _) if template.milestone_id.is_some() => match milestone {
            Some(m) if m.completed => Activation::Inactive(InactiveReason::MilestoneCompleted),
            _ => Activation::Active(ActiveReason::MilestoneOpen),
        },
        _ => Activation::Active(ActiveReason::PermissiveDefault),
    }
}

/// Whether `template` produces an instance for `week`.
pub fn is_active(template: &GoalTemplate, week: WeekId, milestone: Option<&Milestone>) -> bool {
    evaluate(template, week, milestone).is_active()
}
