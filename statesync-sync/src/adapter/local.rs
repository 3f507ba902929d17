//! Local directory adapter.
//!
//! Stores one pretty-printed `<id>.json` file per entry in a state
//! directory. Works as the working-memory store of a single agent.

use super::PlatformAdapter;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statesync_types::StateEntry;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const ENTRY_EXTENSION: &str = "json";

/// Local adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Directory holding one file per entry.
    pub state_dir: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".statesync/state"),
        }
    }
}

/// File-per-entry adapter over a local directory.
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    state_dir: PathBuf,
}

impl LocalAdapter {
    /// Opens the adapter, creating the state directory if needed.
    pub async fn open(config: LocalConfig) -> Result<Self> {
        if !fs::try_exists(&config.state_dir).await.unwrap_or(false) {
            fs::create_dir_all(&config.state_dir)
                .await
                .map_err(|e| SyncError::Storage(format!("failed to create state dir: {e}")))?;
            info!("Created local state dir: {:?}", config.state_dir);
        }
        Ok(Self {
            state_dir: config.state_dir,
        })
    }

    /// The directory entries are stored in.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Maps an entry id to its file, rejecting ids that would escape the
    /// state directory.
    fn entry_path(&self, id: &str) -> Result<PathBuf> {
        let unsafe_id = id.is_empty()
            || id.starts_with('.')
            || id.contains(['/', '\\'])
            || id.contains('\0');
        if unsafe_id {
            return Err(SyncError::InvalidEntryId(id.to_string()));
        }
        Ok(self.state_dir.join(format!("{id}.{ENTRY_EXTENSION}")))
    }

    async fn read_entry(path: &Path) -> Result<StateEntry> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to read {path:?}: {e}")))?;
        Ok(StateEntry::from_json_slice(&bytes)?)
    }
}

#[async_trait]
impl PlatformAdapter for LocalAdapter {
    async fn get(&self, id: &str) -> Result<Option<StateEntry>> {
        let path = self.entry_path(id)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        Self::read_entry(&path).await.map(Some)
    }

    async fn put(&self, entry: &StateEntry) -> Result<bool> {
        let path = self.entry_path(&entry.id)?;
        let bytes = entry.to_json_pretty()?;
        debug!("Writing {} ({} bytes) to {:?}", entry.id, bytes.len(), path);
        fs::write(&path, bytes)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to write {path:?}: {e}")))?;
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.entry_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SyncError::Storage(format!("failed to delete {path:?}: {e}"))),
        }
    }

    async fn list(&self, entry_type: Option<&str>) -> Result<Vec<StateEntry>> {
        let mut read_dir = fs::read_dir(&self.state_dir)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to read state dir: {e}")))?;

        let mut entries = Vec::new();
        while let Some(dir_entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| SyncError::Storage(format!("failed to read directory entry: {e}")))?
        {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match Self::read_entry(&path).await {
                Ok(entry) if entry_type.is_none_or(|t| entry.entry_type == t) => {
                    entries.push(entry)
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry file {:?}: {e}", path),
            }
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(fs::metadata(&self.state_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }
}
