//! State log configuration structs.

use serde::{Deserialize, Serialize};

use super::common::default_true;
use crate::constants::{DEFAULT_BUFFER_CAPACITY, DEFAULT_STATE_DB_PATH};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateLogConfig {
    /// When disabled, transitions are still detected but nothing is written.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: StateLogBackend,

    /// Path to the redb database file. Ignored by the `log` backend.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    /// Rows buffered before an append triggers an automatic flush.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

fn default_storage_path() -> String {
    DEFAULT_STATE_DB_PATH.to_string()
}
fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

impl Default for StateLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: StateLogBackend::default(),
            storage_path: default_storage_path(),
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

// ── Backend ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateLogBackend {
    #[default]
    Redb,
    Log,
}

impl StateLogBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Log => "log",
        }
    }
}

impl std::fmt::Display for StateLogBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
