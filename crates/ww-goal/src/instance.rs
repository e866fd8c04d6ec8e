// instance.rs — GoalInstance: one concrete occurrence of a goal in one week.
//
// In memory, the kind of goal is a tagged union (`GoalKind`) so that the
// cascade engine can dispatch exhaustively. On disk, instances keep the flat
// record layout that week documents have always used:
//
//   {"id": "...", "template_id": "...", "kind": "weekly_goal", "week_id": "2025-W44",
//    "recurrence": "monthly", "target_date": null, "completed": false, ...}
//
// Conversion between the two happens in `From<StoredGoal>`, which is also
// where legacy records without a `kind` are tagged as weekly goals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ww_calendar::{MonthId, WeekId};

use crate::template::{DreamLink, GoalTemplate, Recurrence};

/// What kind of goal an instance is, with the fields only that kind carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalKind {
    /// Derived from a weekly template; completion never leaves its week.
    Weekly { template_id: String },
    /// Part of a monthly group; completion spans every week of the month.
    Monthly { template_id: String },
    /// Part of a deadline chain; completion prunes the remaining weeks.
    Deadline {
        template_id: String,
        /// Absent on legacy rows written without a due date.
        target_date: Option<NaiveDate>,
    },
    /// A standalone goal with no template.
    OneOff,
}

impl GoalKind {
    pub fn template_id(&self) -> Option<&str> {
        match self {
            GoalKind::Weekly { template_id }
            | GoalKind::Monthly { template_id }
            | GoalKind::Deadline { template_id, .. } => Some(template_id),
            GoalKind::OneOff => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalKind::Weekly { .. } => "weekly",
            GoalKind::Monthly { .. } => "monthly",
            GoalKind::Deadline { .. } => "deadline",
            GoalKind::OneOff => "one-off",
        }
    }
}

/// One goal scoped to exactly one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredGoal", into = "StoredGoal")]
pub struct GoalInstance {
    pub id: String,
    pub week: WeekId,
    pub title: String,
    pub description: String,
    pub dream: Option<DreamLink>,
    pub kind: GoalKind,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GoalInstance {
    /// Instantiate `template` for `week`. The kind follows the template's recurrence.
    pub fn from_template(template: &GoalTemplate, week: WeekId, now: DateTime<Utc>) -> Self {
        let template_id = template.id.clone();
        let kind = match template.recurrence {
            Recurrence::Weekly => GoalKind::Weekly { template_id },
            Recurrence::Monthly => GoalKind::Monthly { template_id },
        };
        Self {
            id: template.instance_id(week),
            week,
            title: template.title.clone(),
            description: template.description.clone(),
            dream: template.dream.clone(),
            kind,
            completed: false,
            completed_at: None,
            created_at: now,
        }
    }

    /// A standalone goal with a fresh id.
    pub fn one_off(week: WeekId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            week,
            title: title.into(),
            description: description.into(),
            dream: None,
            kind: GoalKind::OneOff,
            completed: false,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn template_id(&self) -> Option<&str> {
        self.kind.template_id()
    }

    pub fn month_id(&self) -> MonthId {
        self.week.month_id()
    }

    /// Set the completion flag, stamping or clearing `completed_at`.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.completed = completed;
        self.completed_at = completed.then_some(now);
    }
}

/// Flat on-disk record of a goal instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredGoal {
    pub id: String,

    #[serde(default)]
    pub template_id: Option<String>,

    /// `weekly_goal` or `deadline`; absent in legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub week_id: WeekId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dream: Option<DreamLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

const KIND_WEEKLY_GOAL: &str = "weekly_goal";
const KIND_DEADLINE: &str = "deadline";

impl From<StoredGoal> for GoalInstance {
    fn from(stored: StoredGoal) -> Self {
        let kind = match (stored.kind.as_deref(), stored.template_id, stored.target_date) {
            (Some(KIND_DEADLINE), template_id, target_date) => {
                if target_date.is_none() {
                    tracing::warn!("deadline goal {} has no target_date", stored.id);
                }
                GoalKind::Deadline {
                    template_id: template_id.unwrap_or_else(|| stored.id.clone()),
                    target_date,
                }
            }
            (_, Some(template_id), _) if stored.recurrence == Some(Recurrence::Monthly) => {
                GoalKind::Monthly { template_id }
            }
            (_, Some(template_id), _) => GoalKind::Weekly { template_id },
            (_, None, _) => GoalKind::OneOff,
        };
        Self {
            id: stored.id,
            week: stored.week_id,
            title: stored.title,
            description: stored.description,
            dream: stored.dream,
            kind,
            completed: stored.completed,
            completed_at: stored.completed_at,
            created_at: stored.created_at,
        }
    }
}

impl From<GoalInstance> for StoredGoal {
    fn from(goal: GoalInstance) -> Self {
        let (kind, template_id, recurrence, target_date) = match goal.kind {
            GoalKind::Weekly { template_id } => (
                KIND_WEEKLY_GOAL,
                Some(template_id),
                Some(Recurrence::Weekly),
                None,
            ),
            GoalKind::Monthly { template_id } => (
                KIND_WEEKLY_GOAL,
                Some(template_id),
                Some(Recurrence::Monthly),
                None,
            ),
            GoalKind::Deadline {
                template_id,
                target_date,
            } => (KIND_DEADLINE, Some(template_id), None, target_date),
            GoalKind::OneOff => (KIND_WEEKLY_GOAL, None, None, None),
        };
        Self {
            id: goal.id,
            template_id,
            kind: Some(kind.to_string()),
            week_id: goal.week,
            title: goal.title,
            description: goal.description,
            dream: goal.dream,
            recurrence,
            target_date,
            completed: goal.completed,
            completed_at: goal.completed_at,
            created_at: goal.created_at,
        }
    }
}
