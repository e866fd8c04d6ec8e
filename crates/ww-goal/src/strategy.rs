// strategy.rs — How a newly created goal turns into instances.
//
// The shape of the creation request picks the strategy:
//
//   Template, weekly recurrence → LazyPerWeek
//       Only the template is persisted. `load_or_create` expands it one week
//       at a time as weeks are visited.
//
//   Template, monthly recurrence → EagerBatch
//   Series (monthly goal or deadline goal) → EagerBatch
//       Every instance is persisted immediately, because completion cascades
//       act on sibling rows that must already exist.
//         monthly:  target_weeks, or target_months * 4, consecutive weeks
//                   from the start week
//         deadline: ceil(days until the deadline / 7) weeks (at least one)
//
// Eager instances land in weeks that may not have been visited yet. Such a
// week is materialized from the template list first, so that it still gets
// its lazy goals when it is eventually loaded.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ww_calendar::WeekId;

use crate::error::GoalError;
use crate::instance::{GoalInstance, GoalKind};
use crate::materializer::{instances_for_week, MilestoneLookup};
use crate::store::{MilestoneSource, WeekStore};
use crate::template::{instance_id, DreamLink, DurationType, GoalTemplate, Recurrence};

/// Weeks a monthly goal covers per target month.
pub const WEEKS_PER_MONTH: u32 = 4;

/// Shape-specific parameters of an eagerly expanded goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesShape {
    Monthly {
        target_months: u32,
        start_week: WeekId,
    },
    Deadline {
        target_date: NaiveDate,
        created_on: NaiveDate,
    },
}

/// Request to create a monthly or deadline goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dream: Option<DreamLink>,
    pub shape: SeriesShape,
}

impl SeriesRequest {
    pub fn monthly(title: impl Into<String>, target_months: u32, start_week: WeekId) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            dream: None,
            shape: SeriesShape::Monthly {
                target_months,
                start_week,
            },
        }
    }

    pub fn deadline(title: impl Into<String>, target_date: NaiveDate, created_on: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            dream: None,
            shape: SeriesShape::Deadline {
                target_date,
                created_on,
            },
        }
    }
}

/// A goal creation request; its shape selects the instantiation strategy.
#[derive(Debug, Clone)]
pub enum GoalRequest {
    Template(GoalTemplate),
    Series(SeriesRequest),
}

impl GoalRequest {
    pub fn strategy(self) -> Result<Box<dyn InstantiationStrategy>, GoalError> {
        match self {
            GoalRequest::Template(template) if template.recurrence == Recurrence::Monthly => {
                Ok(Box::new(EagerBatch::from_template(&template)?))
            }
            GoalRequest::Template(template) => Ok(Box::new(LazyPerWeek::new(template)?)),
            GoalRequest::Series(request) => Ok(Box::new(EagerBatch::new(request)?)),
        }
    }
}

/// Turns a creation request into a template and/or creation-time instances.
pub trait InstantiationStrategy {
    fn name(&self) -> &'static str;

    /// A template to register for lazy per-week expansion.
    fn template(&self) -> Option<&GoalTemplate>;

    /// Weeks that receive an instance at creation time, in order.
    fn creation_weeks(&self) -> Vec<WeekId>;

    /// The creation-time instance for one of `creation_weeks()`.
    fn instance_for(&self, week: WeekId, now: DateTime<Utc>) -> GoalInstance;
}

/// Weekly templates, expanded on visit.
pub struct LazyPerWeek {
    template: GoalTemplate,
}

impl LazyPerWeek {
    pub fn new(template: GoalTemplate) -> Result<Self, GoalError> {
        if template.title.trim().is_empty() {
            return Err(GoalError::InvalidRequest("template title is empty".to_string()));
        }
        if template.recurrence == Recurrence::Monthly {
            return Err(GoalError::InvalidRequest(format!(
                "monthly template {} must be expanded eagerly",
                template.id
            )));
        }
        if template.duration_type == DurationType::Weeks && template.duration_weeks == Some(0) {
            return Err(GoalError::InvalidRequest(
                "duration_weeks must be at least 1".to_string(),
            ));
        }
        if template.duration_type == DurationType::Weeks && template.duration_weeks.is_none() {
            tracing::warn!(
                "template {} ({}) has a weeks duration without duration_weeks; it will never expire",
                template.id,
                template.title
            );
        }
        Ok(Self { template })
    }
}

impl InstantiationStrategy for LazyPerWeek {
    fn name(&self) -> &'static str {
        "lazy_per_week"
    }

    fn template(&self) -> Option<&GoalTemplate> {
        Some(&self.template)
    }

    fn creation_weeks(&self) -> Vec<WeekId> {
        Vec::new()
    }

    fn instance_for(&self, week: WeekId, now: DateTime<Utc>) -> GoalInstance {
        GoalInstance::from_template(&self.template, week, now)
    }
}

/// Monthly and deadline goals, fully expanded at creation.
pub struct EagerBatch {
    template_id: String,
    request: SeriesRequest,
    start_week: WeekId,
    week_count: u32,
}

impl EagerBatch {
    pub fn new(request: SeriesRequest) -> Result<Self, GoalError> {
        if request.title.trim().is_empty() {
            return Err(GoalError::InvalidRequest("goal title is empty".to_string()));
        }
        let (start_week, week_count) = match request.shape {
            SeriesShape::Monthly {
                target_months,
                start_week,
            } => (start_week, monthly_week_count(target_months)?),
            SeriesShape::Deadline {
                target_date,
                created_on,
            } => {
                let days = (target_date - created_on).num_days();
                if days < 0 {
                    return Err(GoalError::InvalidRequest(format!(
                        "deadline {} is before {}",
                        target_date, created_on
                    )));
                }
                let weeks = u32::try_from((days + 6) / 7).unwrap_or(u32::MAX).max(1);
                (WeekId::from_date(created_on), weeks)
            }
        };
        Ok(Self {
            template_id: Uuid::new_v4().to_string(),
            request,
            start_week,
            week_count,
        })
    }

    /// Expand a monthly template from its start week.
    ///
    /// The batch reuses the template's id, so instance ids match the ones the
    /// lazy path would have produced.
    pub fn from_template(template: &GoalTemplate) -> Result<Self, GoalError> {
        if template.recurrence != Recurrence::Monthly {
            return Err(GoalError::InvalidRequest(format!(
                "template {} is not monthly",
                template.id
            )));
        }
        if template.title.trim().is_empty() {
            return Err(GoalError::InvalidRequest("template title is empty".to_string()));
        }
        let week_count = match (template.target_weeks, template.target_months) {
            (Some(0), _) => {
                return Err(GoalError::InvalidRequest(
                    "target_weeks must be at least 1".to_string(),
                ))
            }
            (Some(weeks), _) => weeks,
            (None, Some(months)) => monthly_week_count(months)?,
            (None, None) => {
                return Err(GoalError::InvalidRequest(format!(
                    "monthly template {} needs target_months or target_weeks",
                    template.id
                )))
            }
        };
        let start_week = template.start_week();
        let target_months = template
            .target_months
            .unwrap_or_else(|| week_count.div_ceil(WEEKS_PER_MONTH));

        Ok(Self {
            template_id: template.id.clone(),
            request: SeriesRequest {
                title: template.title.clone(),
                description: template.description.clone(),
                dream: template.dream.clone(),
                shape: SeriesShape::Monthly {
                    target_months,
                    start_week,
                },
            },
            start_week,
            week_count,
        })
    }

    /// Shared template id of every instance in the batch.
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn week_count(&self) -> u32 {
        self.week_count
    }
}

fn monthly_week_count(target_months: u32) -> Result<u32, GoalError> {
    if target_months == 0 {
        return Err(GoalError::InvalidRequest(
            "target_months must be at least 1".to_string(),
        ));
    }
    target_months.checked_mul(WEEKS_PER_MONTH).ok_or_else(|| {
        GoalError::InvalidRequest(format!("target_months {} is too large", target_months))
    })
}

impl InstantiationStrategy for EagerBatch {
    fn name(&self) -> &'static str {
        "eager_batch"
    }

    fn template(&self) -> Option<&GoalTemplate> {
        None
    }

    fn creation_weeks(&self) -> Vec<WeekId> {
        (0..i64::from(self.week_count))
            .map(|n| self.start_week.offset(n))
            .collect()
    }

    fn instance_for(&self, week: WeekId, now: DateTime<Utc>) -> GoalInstance {
        let template_id = self.template_id.clone();
        let kind = match self.request.shape {
            SeriesShape::Monthly { .. } => GoalKind::Monthly { template_id },
            SeriesShape::Deadline { target_date, .. } => GoalKind::Deadline {
                template_id,
                target_date: Some(target_date),
            },
        };
        GoalInstance {
            id: instance_id(&self.template_id, week),
            week,
            title: self.request.title.clone(),
            description: self.request.description.clone(),
            dream: self.request.dream.clone(),
            kind,
            completed: false,
            completed_at: None,
            created_at: now,
        }
    }
}

/// What a creation wrote.
#[derive(Debug, Clone, Default)]
pub struct Created {
    /// The registered template, for lazy goals.
    pub template: Option<GoalTemplate>,
    /// Instances written at creation time.
    pub instances: Vec<GoalInstance>,
    /// Every week whose stored goal list changed.
    pub touched_weeks: Vec<WeekId>,
}

/// Persist a goal according to its strategy.
///
/// `templates` is the user's template list before this creation.
pub fn create_goal<S, M>(
    store: &S,
    milestones: &M,
    user_id: &str,
    strategy: &dyn InstantiationStrategy,
    templates: &[GoalTemplate],
) -> Result<Created, GoalError>
where
    S: WeekStore + ?Sized,
    M: MilestoneSource + ?Sized,
{
    let now = Utc::now();
    let mut created = Created::default();

    if let Some(template) = strategy.template() {
        store.save_template(user_id, template)?;
        created.template = Some(template.clone());

        // A start week materialized before the template existed would never
        // pick it up, so it is backfilled here.
        let start = template.start_week();
        let doc = store.week_document(user_id, start.year())?;
        if let Some(goals) = doc.goals(start) {
            let lookup = MilestoneLookup::fetch(milestones, std::slice::from_ref(template))?;
            let active = !instances_for_week(std::slice::from_ref(template), &lookup, start, now)
                .is_empty();
            let id = template.instance_id(start);
            if active && !goals.iter().any(|g| g.id == id) {
                let mut goals = goals.to_vec();
                let instance = strategy.instance_for(start, now);
                goals.push(instance.clone());
                store.save_week(user_id, start.year(), start, &goals)?;
                created.instances.push(instance);
                created.touched_weeks.push(start);
            }
        }
    }

    let weeks = strategy.creation_weeks();
    if weeks.is_empty() {
        return Ok(created);
    }

    let lookup = MilestoneLookup::fetch(milestones, templates)?;
    let mut by_year: BTreeMap<i32, Vec<WeekId>> = BTreeMap::new();
    for week in weeks {
        by_year.entry(week.year()).or_default().push(week);
    }

    for (year, weeks) in by_year {
        let doc = store.week_document(user_id, year)?;
        for week in weeks {
            let mut goals = match doc.goals(week) {
                Some(goals) => goals.to_vec(),
                None => instances_for_week(templates, &lookup, week, now),
            };
            let instance = strategy.instance_for(week, now);
            if goals.iter().any(|g| g.id == instance.id) {
                continue;
            }
            goals.push(instance.clone());
            store.save_week(user_id, year, week, &goals)?;
            created.instances.push(instance);
            created.touched_weeks.push(week);
        }
    }

    tracing::info!(
        "created goal via {}: {} instance(s) across {} week(s)",
        strategy.name(),
        created.instances.len(),
        created.touched_weeks.len()
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::memory::MemoryWeekStore;
    use crate::store::NoMilestones;

    fn week(s: &str) -> WeekId {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn shape_selects_strategy() {
        let lazy = GoalRequest::Template(GoalTemplate::new("Run", Recurrence::Weekly, date(2025, 1, 6)))
            .strategy()
            .unwrap();
        assert_eq!(lazy.name(), "lazy_per_week");
        assert!(lazy.creation_weeks().is_empty());

        let eager = GoalRequest::Series(SeriesRequest::monthly("Budget", 2, week("2025-W10")))
            .strategy()
            .unwrap();
        assert_eq!(eager.name(), "eager_batch");
        assert_eq!(eager.creation_weeks().len(), 8);
    }

    #[test]
    fn deadline_weeks_round_up() {
        let batch = EagerBatch::new(SeriesRequest::deadline("Ship", date(2025, 3, 31), date(2025, 3, 3)))
            .unwrap();
        let weeks: Vec<String> = batch.creation_weeks().iter().map(|w| w.to_string()).collect();
        assert_eq!(weeks, vec!["2025-W10", "2025-W11", "2025-W12", "2025-W13"]);

        let batch = EagerBatch::new(SeriesRequest::deadline("Ship", date(2025, 3, 4), date(2025, 3, 3)))
            .unwrap();
        assert_eq!(batch.creation_weeks().len(), 1);

        let same_day = EagerBatch::new(SeriesRequest::deadline("Ship", date(2025, 3, 3), date(2025, 3, 3)))
            .unwrap();
        assert_eq!(same_day.creation_weeks().len(), 1);
    }

    #[test]
    fn rejects_invalid_requests() {
        assert!(matches!(
            EagerBatch::new(SeriesRequest::deadline("Late", date(2025, 3, 1), date(2025, 3, 3))),
            Err(GoalError::InvalidRequest(_))
        ));
        assert!(matches!(
            EagerBatch::new(SeriesRequest::monthly("None", 0, week("2025-W10"))),
            Err(GoalError::InvalidRequest(_))
        ));
        assert!(matches!(
            LazyPerWeek::new(GoalTemplate::new(" ", Recurrence::Weekly, date(2025, 1, 6))),
            Err(GoalError::InvalidRequest(_))
        ));
    }

    #[test]
    fn monthly_templates_are_expanded_eagerly() {
        let template = GoalTemplate::new("Budget", Recurrence::Monthly, date(2025, 3, 3)).for_months(2);
        let id = template.id.clone();
        let strategy = GoalRequest::Template(template).strategy().unwrap();
        assert_eq!(strategy.name(), "eager_batch");
        assert!(strategy.template().is_none());

        let weeks = strategy.creation_weeks();
        assert_eq!(weeks.len(), 8);
        assert_eq!(weeks[0], week("2025-W10"));
        let instance = strategy.instance_for(weeks[0], Utc::now());
        assert_eq!(instance.id, format!("{}_2025-W10", id));
        assert!(matches!(instance.kind, GoalKind::Monthly { .. }));
    }

    #[test]
    fn monthly_template_size_comes_from_its_targets() {
        let base = GoalTemplate::new("Budget", Recurrence::Monthly, date(2025, 3, 3));
        assert!(matches!(
            EagerBatch::from_template(&base),
            Err(GoalError::InvalidRequest(_))
        ));

        let mut by_weeks = base.clone().for_months(3);
        by_weeks.target_weeks = Some(5);
        assert_eq!(EagerBatch::from_template(&by_weeks).unwrap().week_count(), 5);

        assert!(matches!(
            LazyPerWeek::new(base.for_months(1)),
            Err(GoalError::InvalidRequest(_))
        ));
    }

    #[test]
    fn oversized_month_counts_are_rejected() {
        assert!(matches!(
            EagerBatch::new(SeriesRequest::monthly("Forever", u32::MAX, week("2025-W10"))),
            Err(GoalError::InvalidRequest(_))
        ));
        let huge = GoalTemplate::new("Forever", Recurrence::Monthly, date(2025, 3, 3))
            .for_months(u32::MAX / 2);
        assert!(matches!(
            EagerBatch::from_template(&huge),
            Err(GoalError::InvalidRequest(_))
        ));
    }

    #[test]
    fn eager_weeks_are_materialized_with_lazy_goals_first() {
        let store = MemoryWeekStore::new();
        let mut run = GoalTemplate::new("Run", Recurrence::Weekly, date(2025, 1, 6));
        run.id = "run".to_string();
        let templates = vec![run];

        let strategy = EagerBatch::new(SeriesRequest::monthly("Budget", 1, week("2025-W10"))).unwrap();
        let created = create_goal(&store, &NoMilestones, "u", &strategy, &templates).unwrap();
        assert_eq!(created.instances.len(), 4);

        let w10 = store.stored_goals("u", week("2025-W10")).unwrap();
        assert_eq!(w10.len(), 2);
        assert_eq!(w10[0].id, "run_2025-W10");
        assert_eq!(w10[1].id, format!("{}_2025-W10", strategy.template_id()));
    }

    #[test]
    fn lazy_template_backfills_an_already_loaded_start_week() {
        let store = MemoryWeekStore::new();
        store.save_week("u", 2025, week("2025-W10"), &[]).unwrap();

        let mut t = GoalTemplate::new("Stretch", Recurrence::Weekly, date(2025, 3, 5));
        t.id = "stretch".to_string();
        let strategy = LazyPerWeek::new(t).unwrap();
        let created = create_goal(&store, &NoMilestones, "u", &strategy, &[]).unwrap();

        assert_eq!(created.touched_weeks, vec![week("2025-W10")]);
        assert_eq!(store.templates("u").unwrap().len(), 1);
        let goals = store.stored_goals("u", week("2025-W10")).unwrap();
        assert_eq!(goals[0].id, "stretch_2025-W10");
    }

    #[test]
    fn lazy_template_does_not_touch_unvisited_weeks() {
        let store = MemoryWeekStore::new();
        let strategy =
            LazyPerWeek::new(GoalTemplate::new("Stretch", Recurrence::Weekly, date(2025, 3, 5))).unwrap();
        let created = create_goal(&store, &NoMilestones, "u", &strategy, &[]).unwrap();
        assert!(created.instances.is_empty());
        assert_eq!(store.save_count(), 0);
    }
}
