//! Weekwise configuration (`.weekwise/config.toml`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GoalError;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".weekwise/config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekwiseConfig {
    /// Whose goals to operate on.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Root directory of the JSON week store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Optional JSONL file receiving goal events.
    #[serde(default)]
    pub event_log: Option<PathBuf>,
}

impl Default for WeekwiseConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            data_dir: default_data_dir(),
            event_log: None,
        }
    }
}

// Serde default functions
fn default_user_id() -> String {
    "local".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".weekwise/data")
}

impl WeekwiseConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, GoalError> {
        let content = std::fs::read_to_string(path).map_err(|source| GoalError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load config, returning defaults if the file doesn't exist.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, GoalError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
