//! Core type definitions for statesync.
//!
//! This crate defines the record type moved between backing stores and the
//! hashing rules every other crate relies on:
//! - [`StateEntry`], the versioned, typed, hashed record
//! - [`Platform`] names and sync [`RunId`]s
//! - Canonical JSON encoding and SHA-256 helpers
//!
//! Hash equality is treated as content equality by the sync engine, so
//! every component that creates or mutates an entry must go through
//! [`StateEntry::compute_hash`].

mod entry;
pub mod hash;
mod ids;
mod time;

pub use entry::StateEntry;
pub use hash::{canonical_json, hash_for_sync, sha256_hex, verify_sync_hash};
pub use ids::{Platform, RunId};
pub use time::unix_now;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid run id: {0}")]
    InvalidRunId(#[from] uuid::Error),

    #[error("hash mismatch for entry {id}: stored {stored}, computed {computed}")]
    HashMismatch {
        id: String,
        stored: String,
        computed: String,
    },
}
