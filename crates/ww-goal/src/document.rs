// document.rs — WeekDocument: all of one user's goals for one ISO year.
//
// The document is the unit of durability. A save replaces one week's entry
// inside it; there is no concurrency token, so two writers on the same
// (user, year) document race and the later write wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ww_calendar::WeekId;

use crate::instance::GoalInstance;

/// The goals stored for one week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekEntry {
    #[serde(default)]
    pub goals: Vec<GoalInstance>,
}

/// Per-user, per-year collection of week entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekDocument {
    pub user_id: String,
    pub year: i32,
    #[serde(default)]
    pub weeks: BTreeMap<WeekId, WeekEntry>,
}

impl WeekDocument {
    pub fn empty(user_id: impl Into<String>, year: i32) -> Self {
        Self {
            user_id: user_id.into(),
            year,
            weeks: BTreeMap::new(),
        }
    }

    /// Goals for `week`, or `None` if the week was never materialized.
    ///
    /// An empty list is still a materialized week.
    pub fn goals(&self, week: WeekId) -> Option<&[GoalInstance]> {
        self.weeks.get(&week).map(|entry| entry.goals.as_slice())
    }

    pub fn is_materialized(&self, week: WeekId) -> bool {
        self.weeks.contains_key(&week)
    }

    /// Replace the goal list of one week.
    pub fn set_goals(&mut self, week: WeekId, goals: Vec<GoalInstance>) {
        self.weeks.insert(week, WeekEntry { goals });
    }

    /// Number of weeks holding at least one goal.
    pub fn weeks_with_goals(&self) -> usize {
        self.weeks.values().filter(|e| !e.goals.is_empty()).count()
    }
}
