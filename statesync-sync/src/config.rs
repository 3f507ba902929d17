//! Engine configuration.

use crate::error::{Result, SyncError};
use crate::resolution::ConflictResolution;
use serde::{Deserialize, Serialize};
use statesync_types::Platform;
use std::path::Path;
use std::time::Duration;

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Platform new entries are written to first.
    pub primary: Platform,
    /// Policy applied when source and target diverge.
    pub resolution: ConflictResolution,
    /// Maximum write (and read) attempts per entry.
    pub retry_attempts: u32,
    /// Wait before the next attempt, indexed by attempt number and clamped
    /// to the last value.
    pub retry_backoff_ms: Vec<u64>,
    /// Timeout applied to each individual adapter call (ms).
    pub attempt_timeout_ms: u64,
    /// Run target passes concurrently.
    pub parallel_targets: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            primary: Platform::new("local"),
            resolution: ConflictResolution::LastWriteWins,
            retry_attempts: 4,
            retry_backoff_ms: vec![2_000, 4_000, 8_000, 16_000],
            attempt_timeout_ms: 30_000,
            parallel_targets: false,
        }
    }
}

impl SyncConfig {
    /// Loads a JSON config file. Missing keys take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("failed to read {path:?}: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| SyncError::Config(format!("failed to parse {path:?}: {e}")))
    }

    /// Per-attempt timeout as a [`Duration`].
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}
