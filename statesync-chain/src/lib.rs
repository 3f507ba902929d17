//! Hash-chain integrity engine for statesync.
//!
//! A [`HashChain`] is an append-only, depth-indexed tree of content hashes.
//! It answers three questions about a batch of records:
//!
//! - **Which records were attested, and in what causal order?** Every node
//!   links to its parent by the parent's identity hash.
//! - **Has anything been altered since?** [`HashChain::compute_merkle_root`]
//!   folds the deepest level into a single root.
//! - **Is the linkage intact?** [`HashChain::verify_integrity`] lists every
//!   dangling parent reference.
//!
//! # Identity vs. subtree hashes
//!
//! A node's [`identity_hash`](HashNode::identity_hash) covers its content
//! and position only and never changes after creation; it is the only key
//! used for linkage and lookup. The [`infinity_hash`](HashNode::infinity_hash)
//! additionally covers the node's children and is recomputed on demand, so a
//! stale value is never used as an identifier.
//!
//! The chain is an integrity-detection structure, not a security primitive:
//! anyone able to rewrite the whole chain can produce a consistent forgery.

mod chain;
mod error;
mod export;
pub mod merkle;
mod node;

pub use chain::{HashChain, IntegrityReport};
pub use error::{ChainError, ChainResult};
pub use export::{ChainExport, NodeSummary};
pub use merkle::{ConvergenceStamp, DEFAULT_CONVERGENCE_ITERATIONS};
pub use node::HashNode;
