pub mod goal;
pub mod template;
pub mod week;

use ww_goal::{EventDispatcher, GoalSession, JsonWeekStore, LogSink, WeekwiseConfig};

/// Session type used by every command: JSON documents for weeks and milestones.
pub type CliSession = GoalSession<JsonWeekStore, JsonWeekStore>;

/// Open a session over the configured data directory.
pub fn open_session(config: &WeekwiseConfig) -> anyhow::Result<CliSession> {
    let store = JsonWeekStore::new(&config.data_dir)?;
    let milestones = JsonWeekStore::new(&config.data_dir)?;

    let mut events = EventDispatcher::new();
    if let Some(ref path) = config.event_log {
        events.add_sink(Box::new(LogSink::new(path)));
    }

    Ok(GoalSession::new(store, milestones, config.user_id.clone()).with_events(events))
}

/// Shorten `s` to at most `max` characters for table output.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;
    use ww_goal::WeekwiseConfig;

    use super::{open_session, CliSession};

    pub fn session(dir: &TempDir) -> CliSession {
        let config = WeekwiseConfig {
            user_id: "tester".to_string(),
            data_dir: dir.path().join("data"),
            event_log: Some(dir.path().join("events.jsonl")),
        };
        open_session(&config).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_titles() {
        assert_eq!(truncate("Swim", 10), "Swim");
        assert_eq!(truncate("A very long goal title", 10), "A very ...");
    }
}
