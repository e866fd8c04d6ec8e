// memory.rs — In-process WeekStore with failure injection.
//
// Used by tests and by embedders that keep documents elsewhere and only need
// the engine's semantics. Interior mutability (`RefCell`/`Cell`) keeps the
// `&self` trait signature; the store is single-threaded like the engine.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use ww_calendar::WeekId;

use crate::document::WeekDocument;
use crate::error::GoalError;
use crate::instance::GoalInstance;
use crate::store::{MilestoneSource, WeekStore};
use crate::template::{GoalTemplate, Milestone};

#[derive(Default)]
pub struct MemoryWeekStore {
    documents: RefCell<HashMap<(String, i32), WeekDocument>>,
    templates: RefCell<HashMap<String, Vec<GoalTemplate>>>,
    milestones: RefCell<HashMap<String, Milestone>>,
    saves: Cell<usize>,
    /// Fail the save with this 1-based sequence number (and every later one).
    fail_from_save: Cell<Option<usize>>,
    fail_loads: Cell<bool>,
}

impl MemoryWeekStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save_week` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Make the `n`-th save from now (1 = the next one) and all later saves fail.
    pub fn fail_saves_after(&self, n: usize) {
        self.fail_from_save.set(Some(self.saves.get() + n));
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.set(fail);
    }

    /// Clear any injected failures.
    pub fn heal(&self) {
        self.fail_from_save.set(None);
        self.fail_loads.set(false);
    }

    pub fn set_milestone(&self, milestone: Milestone) {
        self.milestones
            .borrow_mut()
            .insert(milestone.id.clone(), milestone);
    }

    /// Goals stored for `week`, bypassing failure injection.
    pub fn stored_goals(&self, user_id: &str, week: WeekId) -> Option<Vec<GoalInstance>> {
        self.documents
            .borrow()
            .get(&(user_id.to_string(), week.year()))
            .and_then(|doc| doc.goals(week).map(|g| g.to_vec()))
    }
}

impl WeekStore for MemoryWeekStore {
    fn week_document(&self, user_id: &str, year: i32) -> Result<WeekDocument, GoalError> {
        if self.fail_loads.get() {
            return Err(GoalError::LoadFailed {
                user_id: user_id.to_string(),
                year,
                reason: "injected load failure".to_string(),
            });
        }
        Ok(self
            .documents
            .borrow()
            .get(&(user_id.to_string(), year))
            .cloned()
            .unwrap_or_else(|| WeekDocument::empty(user_id, year)))
    }

    fn save_week(
        &self,
        user_id: &str,
        year: i32,
        week: WeekId,
        goals: &[GoalInstance],
    ) -> Result<(), GoalError> {
        let attempt = self.saves.get() + 1;
        if self.fail_from_save.get().is_some_and(|n| attempt >= n) {
            return Err(GoalError::SaveFailed {
                user_id: user_id.to_string(),
                week,
                reason: "injected save failure".to_string(),
            });
        }
        if week.year() != year {
            return Err(GoalError::InvalidRequest(format!(
                "week {} does not belong to the {} document",
                week, year
            )));
        }
        self.documents
            .borrow_mut()
            .entry((user_id.to_string(), year))
            .or_insert_with(|| WeekDocument::empty(user_id, year))
            .set_goals(week, goals.to_vec());
        self.saves.set(attempt);
        Ok(())
    }

    fn templates(&self, user_id: &str) -> Result<Vec<GoalTemplate>, GoalError> {
        if self.fail_loads.get() {
            return Err(GoalError::LoadFailed {
                user_id: user_id.to_string(),
                year: 0,
                reason: "injected template load failure".to_string(),
            });
        }
        Ok(self
            .templates
            .borrow()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn save_template(&self, user_id: &str, template: &GoalTemplate) -> Result<(), GoalError> {
        let mut all = self.templates.borrow_mut();
        let templates = all.entry(user_id.to_string()).or_default();
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        Ok(())
    }

    fn document_years(&self, user_id: &str) -> Result<Vec<i32>, GoalError> {
        let mut years: Vec<i32> = self
            .documents
            .borrow()
            .keys()
            .filter(|(user, _)| user == user_id)
            .map(|(_, year)| *year)
            .collect();
        years.sort_unstable();
        Ok(years)
    }
}

impl MilestoneSource for MemoryWeekStore {
    fn milestone(&self, milestone_id: &str) -> Result<Option<Milestone>, GoalError> {
        Ok(self.milestones.borrow().get(milestone_id).cloned())
    }
}
