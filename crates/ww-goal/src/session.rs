// session.rs — GoalSession: the API the UI layer talks to.
//
// A session belongs to one user and owns:
//   - the persistence gateway (`WeekStore`) and milestone source
//   - an in-memory model of the weeks it has seen, behind `Optimistic`
//   - a `LoadCache` of weeks already materialized this session
//   - an `EventDispatcher` for goal events
//
// Toggle flow:
//   1. make sure the week and every week a cascade could reach are in memory
//   2. compute the `CascadePlan` (pure)
//   3. apply it to the model tentatively, keeping the snapshot
//   4. write each touched week in order, stopping at the first failure
//   5. commit, or roll back to the snapshot and report what was committed
//
// Writes already committed before a failure stay committed. The affected
// weeks are invalidated so the next read re-fetches them from the store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ww_calendar::WeekId;

use crate::cache::LoadCache;
use crate::cascade::{self, CascadeKind, WeekGoals};
use crate::error::GoalError;
use crate::events::{EventDispatcher, GoalEvent};
use crate::instance::GoalInstance;
use crate::kpi::{self, WeekKpis};
use crate::materializer::{self, BulkReport};
use crate::optimistic::Optimistic;
use crate::store::{MilestoneSource, WeekStore};
use crate::strategy::{create_goal, Created, EagerBatch, GoalRequest, SeriesRequest};
use crate::template::GoalTemplate;

/// Result of a successful completion toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub goal_id: String,
    pub week: WeekId,
    pub completed: bool,
    pub cascade: CascadeKind,
    pub weeks_written: Vec<WeekId>,
    pub pruned_ids: Vec<String>,
}

pub struct GoalSession<S, M> {
    store: S,
    milestones: M,
    user_id: String,
    cache: LoadCache,
    model: Optimistic<WeekGoals>,
    events: EventDispatcher,
}

impl<S: WeekStore, M: MilestoneSource> GoalSession<S, M> {
    pub fn new(store: S, milestones: M, user_id: impl Into<String>) -> Self {
        Self {
            store,
            milestones,
            user_id: user_id.into(),
            cache: LoadCache::new(),
            model: Optimistic::new(WeekGoals::new()),
            events: EventDispatcher::new(),
        }
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }

    /// Goals currently held in memory for `week`, without touching storage.
    pub fn goals(&self, week: WeekId) -> Option<&[GoalInstance]> {
        self.model.get().get(&week).map(Vec::as_slice)
    }

    pub fn templates(&self) -> Result<Vec<GoalTemplate>, GoalError> {
        self.store.templates(&self.user_id)
    }

    /// Drop every cached week, e.g. after templates were edited elsewhere.
    pub fn refresh(&mut self) {
        self.cache.refresh();
    }

    /// Goals for `week`, materializing the week if this session hasn't yet.
    pub fn load_week_goals_if_needed(&mut self, week: WeekId) -> Result<&[GoalInstance], GoalError> {
        let templates = self.store.templates(&self.user_id)?;
        let in_memory = self.model.get().contains_key(&week);

        if in_memory && !self.cache.needs_load(week, templates.len()) {
            tracing::debug!("load cache hit for {}", week);
        } else {
            let load = materializer::materialize_week(
                &self.store,
                &self.milestones,
                &self.user_id,
                week,
                &templates,
            )?;
            if load.created {
                self.events.dispatch(&GoalEvent::WeekMaterialized {
                    user_id: self.user_id.clone(),
                    week,
                    instances: load.goals.len(),
                    timestamp: Utc::now(),
                });
            }
            self.model.get_mut().insert(week, load.goals);
            self.cache.mark_loaded(week, templates.len());
        }

        Ok(self
            .model
            .get()
            .get(&week)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Pull every stored week a cascade from `week` could reach into memory.
    ///
    /// Monthly groups can start in the previous ISO year (2026-W01 belongs to
    /// December 2025); deadline chains only extend forward.
    fn load_cascade_scope(&mut self, week: WeekId) -> Result<(), GoalError> {
        let years = self.store.document_years(&self.user_id)?;
        for year in years.into_iter().filter(|y| *y >= week.year() - 1) {
            let doc = self.store.week_document(&self.user_id, year)?;
            let model = self.model.get_mut();
            for (w, entry) in doc.weeks {
                model.insert(w, entry.goals);
            }
        }
        Ok(())
    }

    /// Flip completion of one goal and write its cascade.
    pub fn toggle_goal_completion(
        &mut self,
        goal_id: &str,
        week: WeekId,
    ) -> Result<ToggleOutcome, GoalError> {
        self.load_week_goals_if_needed(week)?;
        self.load_cascade_scope(week)?;

        let plan = cascade::toggle(goal_id, week, self.model.get(), Utc::now())?;
        let snapshot = self.model.apply(|weeks| plan.apply_to(weeks));

        let mut committed: Vec<WeekId> = Vec::new();
        for (w, goals) in &plan.writes {
            if let Err(e) = self.store.save_week(&self.user_id, w.year(), *w, goals) {
                self.model.rollback(snapshot);
                for touched in plan.writes.keys() {
                    self.cache.invalidate(*touched);
                }

                if committed.is_empty() {
                    tracing::warn!("toggle of {} in {} failed, reverted: {}", goal_id, week, e);
                    return Err(e);
                }

                let listed: Vec<String> = committed.iter().map(|c| c.to_string()).collect();
                tracing::warn!(
                    "data consistency: cascade for {} committed [{}] before failing at {}; \
                     those weeks must be re-fetched: {}",
                    goal_id,
                    listed.join(", "),
                    w,
                    e
                );
                self.events.dispatch(&GoalEvent::CascadeAborted {
                    user_id: self.user_id.clone(),
                    goal_id: goal_id.to_string(),
                    committed: committed.clone(),
                    failed_week: *w,
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(GoalError::PartialCascade {
                    goal_id: goal_id.to_string(),
                    committed,
                    failed_week: *w,
                    reason: e.to_string(),
                });
            }
            committed.push(*w);
        }

        self.model.commit(snapshot);
        for w in &committed {
            self.cache.invalidate(*w);
        }

        tracing::info!(
            "goal {} in {} marked {} ({} week(s) written)",
            goal_id,
            week,
            if plan.new_completed { "complete" } else { "incomplete" },
            committed.len()
        );
        self.events.dispatch(&GoalEvent::CompletionToggled {
            user_id: self.user_id.clone(),
            goal_id: goal_id.to_string(),
            week,
            completed: plan.new_completed,
            cascade: plan.kind,
            weeks_written: committed.clone(),
            timestamp: Utc::now(),
        });

        Ok(ToggleOutcome {
            goal_id: plan.goal_id,
            week,
            completed: plan.new_completed,
            cascade: plan.kind,
            weeks_written: committed,
            pruned_ids: plan.pruned_ids,
        })
    }

    /// Completed share of the week's goals, 0..=100.
    pub fn week_progress(&mut self, week: WeekId) -> Result<u8, GoalError> {
        let goals = self.load_week_goals_if_needed(week)?;
        Ok(kpi::week_progress(goals))
    }

    pub fn week_kpis(&mut self, week: WeekId) -> Result<WeekKpis, GoalError> {
        let goals = self.load_week_goals_if_needed(week)?.to_vec();
        let doc = self.store.week_document(&self.user_id, week.year())?;
        Ok(WeekKpis::compute(&goals, &doc))
    }

    /// Register a recurring template.
    ///
    /// Weekly templates are stored and expanded lazily as weeks are visited.
    /// Monthly templates are expanded into their full batch of weeks now and
    /// are not stored as templates.
    pub fn create_weekly_template(&mut self, template: GoalTemplate) -> Result<GoalTemplate, GoalError> {
        let registered = template.clone();
        let templates = self.store.templates(&self.user_id)?;
        let strategy = GoalRequest::Template(template).strategy()?;
        let created = create_goal(
            &self.store,
            &self.milestones,
            &self.user_id,
            strategy.as_ref(),
            &templates,
        )?;
        self.absorb(&created);
        self.cache.refresh();

        if created.template.is_some() {
            tracing::info!("created template {} ({})", registered.id, registered.title);
            self.events.dispatch(&GoalEvent::TemplateCreated {
                user_id: self.user_id.clone(),
                template_id: registered.id.clone(),
                title: registered.title.clone(),
                timestamp: Utc::now(),
            });
        } else {
            self.events.dispatch(&GoalEvent::SeriesCreated {
                user_id: self.user_id.clone(),
                template_id: registered.id.clone(),
                title: registered.title.clone(),
                weeks: created.touched_weeks.clone(),
                timestamp: Utc::now(),
            });
        }
        Ok(registered)
    }

    /// Create a monthly or deadline goal and persist all of its instances now.
    pub fn create_monthly_or_deadline_instances(
        &mut self,
        request: SeriesRequest,
    ) -> Result<Vec<GoalInstance>, GoalError> {
        let title = request.title.clone();
        let templates = self.store.templates(&self.user_id)?;
        let strategy = EagerBatch::new(request)?;
        let created = create_goal(
            &self.store,
            &self.milestones,
            &self.user_id,
            &strategy,
            &templates,
        )?;
        self.absorb(&created);

        self.events.dispatch(&GoalEvent::SeriesCreated {
            user_id: self.user_id.clone(),
            template_id: strategy.template_id().to_string(),
            title,
            weeks: created.touched_weeks.clone(),
            timestamp: Utc::now(),
        });
        Ok(created.instances)
    }

    /// Add a standalone goal to `week`.
    pub fn create_one_off(
        &mut self,
        week: WeekId,
        title: &str,
        description: &str,
    ) -> Result<GoalInstance, GoalError> {
        if title.trim().is_empty() {
            return Err(GoalError::InvalidRequest("goal title is empty".to_string()));
        }
        let mut goals = self.load_week_goals_if_needed(week)?.to_vec();
        let goal = GoalInstance::one_off(week, title, description);
        goals.push(goal.clone());
        self.store.save_week(&self.user_id, week.year(), week, &goals)?;
        self.model.get_mut().insert(week, goals);
        Ok(goal)
    }

    /// Flip a template's kill switch. Already-materialized weeks keep their goals.
    pub fn set_template_active(
        &mut self,
        template_id: &str,
        active: bool,
    ) -> Result<GoalTemplate, GoalError> {
        let mut template = self
            .store
            .templates(&self.user_id)?
            .into_iter()
            .find(|t| t.id == template_id)
            .ok_or_else(|| GoalError::TemplateNotFound(template_id.to_string()))?;
        template.active = active;
        self.store.save_template(&self.user_id, &template)?;
        self.cache.refresh();
        Ok(template)
    }

    /// Materialize every week of `year` from the current templates.
    pub fn bulk_instantiate(&mut self, year: i32) -> Result<BulkReport, GoalError> {
        let templates = self.store.templates(&self.user_id)?;
        materializer::bulk_instantiate(&self.store, &self.milestones, &self.user_id, year, &templates)
    }

    /// Forget in-memory copies of weeks a creation wrote to.
    fn absorb(&mut self, created: &Created) {
        for week in &created.touched_weeks {
            self.model.get_mut().remove(week);
            self.cache.invalidate(*week);
        }
    }
}
