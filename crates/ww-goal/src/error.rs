// error.rs — Error types for goal materialization and completion cascades.

use thiserror::Error;
use ww_calendar::{CalendarError, WeekId};

/// Errors that can occur while loading, creating, or toggling goals.
#[derive(Debug, Error)]
pub enum GoalError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize goal data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A week or month id could not be parsed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// The persistence gateway could not return a week document or template list.
    #[error("failed to load goals for user {user_id} ({year}): {reason}")]
    LoadFailed {
        user_id: String,
        year: i32,
        reason: String,
    },

    /// Writing one week's goal list failed; nothing from this operation was committed.
    #[error("failed to save week {week} for user {user_id}: {reason}")]
    SaveFailed {
        user_id: String,
        week: WeekId,
        reason: String,
    },

    /// A multi-week cascade stopped after committing some weeks.
    ///
    /// The committed weeks stay committed in storage; the caller should
    /// re-fetch them instead of trusting its in-memory model.
    #[error(
        "cascade for goal {goal_id} aborted at week {failed_week} after committing {} week(s): {reason}",
        .committed.len()
    )]
    PartialCascade {
        goal_id: String,
        committed: Vec<WeekId>,
        failed_week: WeekId,
        reason: String,
    },

    /// No goal with this id exists in the given week.
    #[error("goal {goal_id} not found in week {week}")]
    GoalNotFound { goal_id: String, week: WeekId },

    /// No template with this id exists for the user.
    #[error("goal template not found: {0}")]
    TemplateNotFound(String),

    /// A creation request was rejected before anything was written.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A notification dispatch failed (non-fatal).
    #[error("notification error: {0}")]
    NotificationError(String),
}
