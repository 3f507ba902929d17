//! Backing-store capability interface.
//!
//! The engine only ever talks to stores through [`PlatformAdapter`]. How an
//! adapter reaches its store (REST API, local files, memory) is invisible
//! to the core; concrete adapters are chosen when the engine is configured.

pub mod local;
pub mod memory;

pub use local::{LocalAdapter, LocalConfig};
pub use memory::MemoryAdapter;

use crate::error::Result;
use async_trait::async_trait;
use statesync_types::StateEntry;

/// Uniform get/put/delete/list/health contract for a backing store.
///
/// An `Err` from any method is treated by the engine as a failed attempt
/// and retried according to the configured policy.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Fetches an entry by id. `Ok(None)` means the store has no such entry.
    async fn get(&self, id: &str) -> Result<Option<StateEntry>>;

    /// Writes an entry, replacing any existing entry with the same id.
    /// Returns whether the store accepted the write.
    async fn put(&self, entry: &StateEntry) -> Result<bool>;

    /// Removes an entry. Returns false if there was nothing to remove.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Lists entries, optionally only those of one type.
    async fn list(&self, entry_type: Option<&str>) -> Result<Vec<StateEntry>>;

    /// Probes whether the store is reachable.
    async fn health_check(&self) -> Result<bool>;
}
