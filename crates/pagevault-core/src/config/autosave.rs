//! Autosave policy configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Editor-side autosave policy: save after `edit_threshold` edits or every
/// `interval_seconds`, whichever comes first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    /// Number of local edits that triggers a save.
    #[serde(default = "default_edit_threshold")]
    pub edit_threshold: u32,
    /// Seconds after the first unsaved edit before a save fires.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl AutosaveConfig {
    /// The interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            edit_threshold: default_edit_threshold(),
            interval_seconds: default_interval(),
        }
    }
}

fn default_edit_threshold() -> u32 {
    100
}

fn default_interval() -> u64 {
    10
}
