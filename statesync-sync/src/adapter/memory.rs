//! In-memory adapter.
//!
//! Holds entries in a map behind a lock. Useful as an edge cache stand-in
//! and as the default test double.

use super::PlatformAdapter;
use crate::error::Result;
use async_trait::async_trait;
use statesync_types::StateEntry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// An adapter backed by a map in process memory.
#[derive(Debug)]
pub struct MemoryAdapter {
    entries: RwLock<BTreeMap<String, StateEntry>>,
    healthy: AtomicBool,
}

impl MemoryAdapter {
    /// Creates an empty, healthy adapter.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            healthy: AtomicBool::new(true),
        }
    }

    /// Creates an adapter pre-populated with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = StateEntry>) -> Self {
        let map = entries.into_iter().map(|e| (e.id.clone(), e)).collect();
        Self {
            entries: RwLock::new(map),
            healthy: AtomicBool::new(true),
        }
    }

    /// Sets what [`health_check`](PlatformAdapter::health_check) reports.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copies out every stored entry, ordered by id.
    pub async fn snapshot(&self) -> Vec<StateEntry> {
        self.entries.read().await.values().cloned().collect()
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformAdapter for MemoryAdapter {
    async fn get(&self, id: &str) -> Result<Option<StateEntry>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn put(&self, entry: &StateEntry) -> Result<bool> {
        self.entries
            .write()
            .await
            .insert(entry.id.clone(), entry.clone());
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(id).is_some())
    }

    async fn list(&self, entry_type: Option<&str>) -> Result<Vec<StateEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|e| entry_type.is_none_or(|t| e.entry_type == t))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}
