// events.rs — Goal events and notification dispatch.
//
// The session emits an event whenever it materializes a week, creates goals,
// or finishes (or abandons) a completion toggle. Sinks subscribe to these:
// the built-in `LogSink` appends JSONL, and chat or notification delivery
// plugs in behind the same trait.
//
// Dispatch is synchronous. A failing sink is logged and skipped; it never
// fails the operation that produced the event.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ww_calendar::WeekId;

use crate::cascade::CascadeKind;
use crate::error::GoalError;

/// Events emitted by a goal session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GoalEvent {
    /// A week was read for the first time and its templates expanded.
    WeekMaterialized {
        user_id: String,
        week: WeekId,
        instances: usize,
        timestamp: DateTime<Utc>,
    },

    /// A recurring template was registered.
    TemplateCreated {
        user_id: String,
        template_id: String,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A monthly or deadline goal was expanded across its weeks.
    SeriesCreated {
        user_id: String,
        template_id: String,
        title: String,
        weeks: Vec<WeekId>,
        timestamp: DateTime<Utc>,
    },

    /// A completion toggle and all of its cascade writes succeeded.
    CompletionToggled {
        user_id: String,
        goal_id: String,
        week: WeekId,
        completed: bool,
        cascade: CascadeKind,
        weeks_written: Vec<WeekId>,
        timestamp: DateTime<Utc>,
    },

    /// A cascade stopped at a failed write.
    CascadeAborted {
        user_id: String,
        goal_id: String,
        committed: Vec<WeekId>,
        failed_week: WeekId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl GoalEvent {
    pub fn event_type(&self) -> &str {
        match self {
            GoalEvent::WeekMaterialized { .. } => "week_materialized",
            GoalEvent::TemplateCreated { .. } => "template_created",
            GoalEvent::SeriesCreated { .. } => "series_created",
            GoalEvent::CompletionToggled { .. } => "completion_toggled",
            GoalEvent::CascadeAborted { .. } => "cascade_aborted",
        }
    }
}

/// Receives goal events.
pub trait NotificationSink {
    /// Handle an event. Errors are logged but don't stop the session.
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError>;
}

/// Appends events as JSON lines to a file, one event per line.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every event recorded so far, oldest first. A missing log is empty.
    pub fn read_events(&self) -> Result<Vec<GoalEvent>, GoalError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(GoalError::from))
            .collect()
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }

    fn io_error(&self, source: std::io::Error) -> GoalError {
        GoalError::IoError {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError> {
        let line = serde_json::to_string(event)?;
        self.append_line(&line).map_err(|e| self.io_error(e))?;
        tracing::debug!("logged {} to {}", event.event_type(), self.path.display());
        Ok(())
    }
}

/// Fans events out to every registered sink.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn dispatch(&self, event: &GoalEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!("notification sink error ({}): {}", event.event_type(), e);
            }
        }
    }
}
