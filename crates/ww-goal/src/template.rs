// template.rs — GoalTemplate: a recurring rule that is not tied to any week.
//
// Templates are authored once and are immutable afterwards, except for the
// `active` kill switch. Whether a template produces an instance for a given
// week is decided by the activation evaluator (activation.rs).

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ww_calendar::WeekId;

/// How often a template recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Weekly,
    Monthly,
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::Weekly => write!(f, "weekly"),
            Recurrence::Monthly => write!(f, "monthly"),
        }
    }
}

/// When a template stops producing instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationType {
    /// Runs until the author disables it.
    #[default]
    Unlimited,
    /// Runs for `duration_weeks` weeks starting from the start week.
    Weeks,
    /// Runs until the linked milestone is completed.
    Milestone,
}

impl fmt::Display for DurationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationType::Unlimited => write!(f, "unlimited"),
            DurationType::Weeks => write!(f, "weeks"),
            DurationType::Milestone => write!(f, "milestone"),
        }
    }
}

/// Backlink to a dream in the external dream aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamLink {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Read-only view of a milestone from the external milestone aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub completed: bool,
}

/// A recurring goal rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalTemplate {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dream: Option<DreamLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<String>,

    pub recurrence: Recurrence,

    #[serde(default)]
    pub duration_type: DurationType,

    /// Required when `duration_type` is `weeks`. A missing value is tolerated
    /// and evaluated permissively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<u32>,

    /// Size of the eager batch for a monthly template; overrides `target_months`.
    /// Never read by the evaluator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weeks: Option<u32>,

    /// Months a monthly template covers, 4 weeks each.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_months: Option<u32>,

    pub start_date: NaiveDate,

    #[serde(default = "default_active")]
    pub active: bool,

    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl GoalTemplate {
    /// Create an active, unlimited template starting on `start_date`.
    pub fn new(title: impl Into<String>, recurrence: Recurrence, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            dream: None,
            milestone_id: None,
            recurrence,
            duration_type: DurationType::Unlimited,
            duration_weeks: None,
            target_weeks: None,
            target_months: None,
            start_date,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Limit the template to `weeks` weeks from its start week.
    pub fn for_weeks(mut self, weeks: u32) -> Self {
        self.duration_type = DurationType::Weeks;
        self.duration_weeks = Some(weeks);
        self
    }

    /// Cover `months` months; only meaningful for monthly templates.
    pub fn for_months(mut self, months: u32) -> Self {
        self.target_months = Some(months);
        self
    }

    /// Run the template until the given milestone is completed.
    pub fn until_milestone(mut self, milestone_id: impl Into<String>) -> Self {
        self.duration_type = DurationType::Milestone;
        self.milestone_id = Some(milestone_id.into());
        self
    }

    pub fn start_week(&self) -> WeekId {
        WeekId::from_date(self.start_date)
    }

    /// Deterministic id of this template's instance in `week`.
    pub fn instance_id(&self, week: WeekId) -> String {
        instance_id(&self.id, week)
    }
}

/// `${template_id}_${week_id}`: instances derived from one template never
/// collide within a week.
pub fn instance_id(template_id: &str, week: WeekId) -> String {
    format!("{}_{}", template_id, week)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    #[test]
    fn new_template_is_active_and_unlimited() {
        let t = GoalTemplate::new("Run", Recurrence::Weekly, start());
        assert!(t.active);
        assert_eq!(t.duration_type, DurationType::Unlimited);
        assert!(t.duration_weeks.is_none());
        assert_eq!(t.start_week().to_string(), "2025-W02");
    }

    #[test]
    fn instance_id_joins_template_and_week() {
        let mut t = GoalTemplate::new("Run", Recurrence::Weekly, start());
        t.id = "tpl-1".to_string();
        let week: WeekId = "2025-W44".parse().unwrap();
        assert_eq!(t.instance_id(week), "tpl-1_2025-W44");
    }

    #[test]
    fn missing_optional_fields_deserialize_with_defaults() {
        let json = r#"{
            "id": "t1",
            "title": "Read",
            "recurrence": "weekly",
            "start_date": "2025-01-06",
            "created_at": "2025-01-01T00:00:00Z"
        }"#;
        let t: GoalTemplate = serde_json::from_str(json).unwrap();
        assert!(t.active);
        assert_eq!(t.duration_type, DurationType::Unlimited);
        assert!(t.dream.is_none());
        assert_eq!(t.description, "");
    }

    #[test]
    fn none_fields_omitted_from_json() {
        let t = GoalTemplate::new("Run", Recurrence::Monthly, start());
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("milestone_id"));
        assert!(!json.contains("duration_weeks"));
        assert!(json.contains("\"recurrence\":\"monthly\""));
    }
}
