// materializer.rs — Expands active templates into persisted, week-scoped instances.
//
// `load_or_create` is the lazy per-visit path: the first read of a week
// evaluates every template for that week, persists whatever qualifies, and
// from then on the stored list is returned verbatim. Because of that
// short-circuit the materializer is idempotent: a week is never given a
// second generation of instances.
//
// `bulk_instantiate` does the same for every week of an ISO year at once
// (onboarding / precomputation).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ww_calendar::{weeks_of_year, WeekId};

use crate::activation::{evaluate, Activation, ActiveReason};
use crate::error::GoalError;
use crate::instance::GoalInstance;
use crate::store::{MilestoneSource, WeekStore};
use crate::template::{DurationType, GoalTemplate, Milestone};

/// Result of reading one week through the materializer.
#[derive(Debug, Clone)]
pub struct WeekLoad {
    pub goals: Vec<GoalInstance>,
    /// True when this call created the week; false when it was already stored.
    pub created: bool,
}

/// Summary of a `bulk_instantiate` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    pub year: i32,
    pub weeks_created: usize,
    pub weeks_skipped: usize,
    pub instances_created: usize,
}

/// Milestones referenced by milestone-bound templates, fetched once per pass.
pub(crate) struct MilestoneLookup {
    milestones: HashMap<String, Option<Milestone>>,
}

impl MilestoneLookup {
    pub(crate) fn fetch<M: MilestoneSource + ?Sized>(
        source: &M,
        templates: &[GoalTemplate],
    ) -> Result<Self, GoalError> {
        let mut milestones = HashMap::new();
        for template in templates {
            if template.duration_type != DurationType::Milestone {
                continue;
            }
            if let Some(id) = &template.milestone_id {
                if !milestones.contains_key(id) {
                    milestones.insert(id.clone(), source.milestone(id)?);
                }
            }
        }
        Ok(Self { milestones })
    }

    fn for_template(&self, template: &GoalTemplate) -> Option<&Milestone> {
        template
            .milestone_id
            .as_ref()
            .and_then(|id| self.milestones.get(id))
            .and_then(Option::as_ref)
    }
}

/// Instances for every template active in `week`, in template order.
pub(crate) fn instances_for_week(
    templates: &[GoalTemplate],
    lookup: &MilestoneLookup,
    week: WeekId,
    now: DateTime<Utc>,
) -> Vec<GoalInstance> {
    templates
        .iter()
        .filter(|template| {
            let activation = evaluate(template, week, lookup.for_template(template));
            if activation == Activation::Active(ActiveReason::PermissiveDefault) {
                tracing::warn!(
                    "template {} ({}) has an incomplete {} duration; treating it as active for {}",
                    template.id,
                    template.title,
                    template.duration_type,
                    week
                );
            }
            activation.is_active()
        })
        .map(|template| GoalInstance::from_template(template, week, now))
        .collect()
}

/// Read `week`, materializing it from `templates` if it was never stored.
pub fn materialize_week<S, M>(
    store: &S,
    milestones: &M,
    user_id: &str,
    week: WeekId,
    templates: &[GoalTemplate],
) -> Result<WeekLoad, GoalError>
where
    S: WeekStore + ?Sized,
    M: MilestoneSource + ?Sized,
{
    let year = week.year();
    let doc = store.week_document(user_id, year)?;
    if let Some(goals) = doc.goals(week) {
        tracing::debug!("week {} already materialized ({} goal(s))", week, goals.len());
        return Ok(WeekLoad {
            goals: goals.to_vec(),
            created: false,
        });
    }

    let lookup = MilestoneLookup::fetch(milestones, templates)?;
    let goals = instances_for_week(templates, &lookup, week, Utc::now());
    store.save_week(user_id, year, week, &goals)?;
    tracing::debug!(
        "materialized week {} for {}: {} of {} template(s) active",
        week,
        user_id,
        goals.len(),
        templates.len()
    );
    Ok(WeekLoad {
        goals,
        created: true,
    })
}

/// Goals for `week`: stored goals if the week exists, otherwise newly materialized ones.
pub fn load_or_create<S, M>(
    store: &S,
    milestones: &M,
    user_id: &str,
    week: WeekId,
    templates: &[GoalTemplate],
) -> Result<Vec<GoalInstance>, GoalError>
where
    S: WeekStore + ?Sized,
    M: MilestoneSource + ?Sized,
{
    materialize_week(store, milestones, user_id, week, templates).map(|load| load.goals)
}

/// Materialize every not-yet-stored week of ISO year `year`.
pub fn bulk_instantiate<S, M>(
    store: &S,
    milestones: &M,
    user_id: &str,
    year: i32,
    templates: &[GoalTemplate],
) -> Result<BulkReport, GoalError>
where
    S: WeekStore + ?Sized,
    M: MilestoneSource + ?Sized,
{
    let doc = store.week_document(user_id, year)?;
    let lookup = MilestoneLookup::fetch(milestones, templates)?;
    let now = Utc::now();

    let mut report = BulkReport {
        year,
        ..BulkReport::default()
    };
    for week in weeks_of_year(year) {
        if doc.is_materialized(week) {
            report.weeks_skipped += 1;
            continue;
        }
        let goals = instances_for_week(templates, &lookup, week, now);
        store.save_week(user_id, year, week, &goals)?;
        report.weeks_created += 1;
        report.instances_created += goals.len();
    }

    tracing::info!(
        "bulk instantiated {} for {}: {} week(s) created, {} skipped, {} instance(s)",
        year,
        user_id,
        report.weeks_created,
        report.weeks_skipped,
        report.instances_created
    );
    Ok(report)
}
