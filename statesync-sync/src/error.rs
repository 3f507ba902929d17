//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Transient adapter failures are retried inside the engine and only show
/// up as counts in a [`SyncResult`](crate::SyncResult); the variants here
/// are what crosses the engine boundary or what adapters raise.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No adapter is registered under this platform name.
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    /// An adapter could not reach or update its backing store.
    #[error("{platform} adapter error: {message}")]
    Adapter { platform: String, message: String },

    /// Local storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Entry model error (hash mismatch, malformed entry).
    #[error(transparent)]
    Entry(#[from] statesync_types::Error),

    /// Hash chain error during attestation.
    #[error(transparent)]
    Chain(#[from] statesync_chain::ChainError),

    /// Entry id cannot be used as a storage key.
    #[error("invalid entry id: {0:?}")]
    InvalidEntryId(String),

    /// No pending conflict for this target and entry.
    #[error("no pending conflict for {id} on {target}")]
    ConflictNotFound { target: String, id: String },

    /// A write did not succeed within the retry budget.
    #[error("write of {id} to {platform} failed after retries")]
    WriteFailed { platform: String, id: String },

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// The run was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Builds an [`SyncError::Adapter`] error.
    pub fn adapter(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Adapter {
            platform: platform.into(),
            message: message.into(),
        }
    }
}
