// kpi.rs — Progress figures for a week.

use serde::{Deserialize, Serialize};

use crate::document::WeekDocument;
use crate::instance::GoalInstance;

/// Headline numbers for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekKpis {
    pub active_goals: usize,
    pub completed_goals: usize,
    pub percent_completed: u8,
    /// Weeks of the same year document holding at least one goal.
    pub total_weeks_with_goals: usize,
}

impl WeekKpis {
    pub fn compute(goals: &[GoalInstance], document: &WeekDocument) -> Self {
        Self {
            active_goals: goals.len(),
            completed_goals: goals.iter().filter(|g| g.completed).count(),
            percent_completed: week_progress(goals),
            total_weeks_with_goals: document.weeks_with_goals(),
        }
    }
}

/// Completed share of `goals` as a rounded percentage; 0 for an empty week.
pub fn week_progress(goals: &[GoalInstance]) -> u8 {
    if goals.is_empty() {
        return 0;
    }
    let done = goals.iter().filter(|g| g.completed).count();
    let percent = (done * 100 + goals.len() / 2) / goals.len();
    percent.min(100) as u8
}
