// cache.rs — Session-scoped record of which weeks were already materialized.
//
// Lifecycle:
//   - created empty with the session
//   - `mark_loaded(week, n)` after a week is read through the materializer
//   - `invalidate(week)` when a cascade writes to or prunes that week
//   - `refresh()` when templates are created or edited
//
// A week is skipped only while it is cached *and* the template count seen at
// the last check is unchanged. The cache is an optimization; correctness
// comes from the materializer being idempotent.

use std::collections::HashSet;

use ww_calendar::WeekId;

#[derive(Debug, Default)]
pub struct LoadCache {
    loaded: HashSet<WeekId>,
    template_count: Option<usize>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `week` has to go through the materializer.
    pub fn needs_load(&self, week: WeekId, template_count: usize) -> bool {
        !self.loaded.contains(&week) || self.template_count != Some(template_count)
    }

    pub fn mark_loaded(&mut self, week: WeekId, template_count: usize) {
        if self.template_count != Some(template_count) {
            // Weeks cached under a different template list are stale.
            self.loaded.clear();
            self.template_count = Some(template_count);
        }
        self.loaded.insert(week);
    }

    pub fn invalidate(&mut self, week: WeekId) {
        if self.loaded.remove(&week) {
            tracing::debug!("load cache: invalidated {}", week);
        }
    }

    /// Forget every cached week.
    pub fn refresh(&mut self) {
        self.loaded.clear();
        self.template_count = None;
    }

    pub fn is_loaded(&self, week: WeekId) -> bool {
        self.loaded.contains(&week)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}
