//! Multi-store sync engine for statesync.
//!
//! Keeps typed [`StateEntry`] records consistent across independent,
//! failure-prone backing stores.
//!
//! # Architecture
//!
//! - **Adapters**: every store sits behind the five-operation
//!   [`PlatformAdapter`] interface. [`LocalAdapter`] and [`MemoryAdapter`]
//!   ship with the crate; remote stores are implemented by callers.
//! - **Engine**: [`SyncEngine`] lists a source, diffs each entry against
//!   every target by content hash, resolves divergences with the configured
//!   [`ConflictResolution`], and writes with bounded retry.
//! - **Reports**: one [`SyncResult`] per target, aggregated into a
//!   [`SyncReport`].
//! - **Attestation**: finished runs can be recorded in a [`SharedChain`].
//!
//! Unresolved conflicts are data, not errors: a run with conflicts can
//! still be successful. Check [`SyncResult::conflicts`] and
//! [`SyncEngine::pending_conflicts`].
//!
//! # Example
//!
//! ```
//! use statesync_sync::{MemoryAdapter, SyncConfig, SyncEngine, SyncRequest};
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let engine = SyncEngine::new(SyncConfig::default())
//!     .with_adapter("local", Arc::new(MemoryAdapter::new()))
//!     .with_adapter("cloudflare", Arc::new(MemoryAdapter::new()));
//!
//! let results = engine
//!     .sync(&SyncRequest::new("local", ["cloudflare"]))
//!     .await
//!     .unwrap();
//! assert!(results[0].success);
//! # });
//! ```

pub mod adapter;
mod attest;
mod cancel;
mod config;
mod conflicts;
mod engine;
mod error;
mod hooks;
mod report;
mod resolution;
mod retry;

pub use adapter::{LocalAdapter, LocalConfig, MemoryAdapter, PlatformAdapter};
pub use attest::{SharedChain, attest_entries, attest_report, shared_chain};
pub use cancel::{CancelHandle, CancelToken};
pub use config::SyncConfig;
pub use conflicts::PendingConflict;
pub use engine::{SyncEngine, SyncRequest};
pub use error::{Result, SyncError};
pub use hooks::SyncHook;
pub use report::{ConflictRecord, EntryDigest, SyncReport, SyncResult, TargetSummary};
pub use resolution::{ConflictResolution, ManualResolution, merge_entries};
pub use retry::RetryPolicy;

pub use statesync_types::{Platform, RunId, StateEntry};
