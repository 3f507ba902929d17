//! Error types for the hash chain.

use thiserror::Error;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur while building or importing a chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A parent hash was supplied that is not indexed in this chain.
    #[error("unknown parent hash: {0}")]
    UnknownParent(String),

    /// A node with the same identity hash is already indexed.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// The exported root hash does not match the exported seed.
    #[error("root hash mismatch: expected {expected}, found {found}")]
    RootMismatch { expected: String, found: String },

    /// An imported node's recorded identity hash does not match its content.
    #[error("node {index}: recorded hash {recorded} does not match computed {computed}")]
    HashMismatch {
        index: usize,
        recorded: String,
        computed: String,
    },

    /// An imported node has a different number of children than exported.
    #[error("node {index}: exported {expected} children, linkage yields {found}")]
    ChildrenMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
