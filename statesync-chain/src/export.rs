//! Export and import of a chain's full node set.

use crate::chain::HashChain;
use crate::error::{ChainError, ChainResult};
use crate::merkle::DEFAULT_CONVERGENCE_ITERATIONS;
use crate::node::HashNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use statesync_types::sha256_hex;
use std::collections::BTreeMap;

/// Format version written by [`HashChain::export`].
pub const EXPORT_VERSION: &str = "1.0";

/// Serializable snapshot of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainExport {
    pub version: String,
    pub root_seed: String,
    pub root_hash: String,
    pub merkle_root: String,
    /// Convergence stamp rendered as `INF:<iterations>:<hash>`.
    pub convergence_hash: String,
    pub chain_length: usize,
    pub max_depth: usize,
    pub nodes: Vec<NodeSummary>,
    pub exported_at: DateTime<Utc>,
}

/// Per-node record in a [`ChainExport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub data_hash: String,
    pub identity_hash: String,
    pub infinity_hash: String,
    pub depth: usize,
    pub timestamp: f64,
    pub parent_hash: String,
    pub children_count: usize,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl From<&HashNode> for NodeSummary {
    fn from(node: &HashNode) -> Self {
        Self {
            data_hash: node.data_hash().to_string(),
            identity_hash: node.identity_hash().to_string(),
            infinity_hash: node.infinity_hash(),
            depth: node.depth(),
            timestamp: node.timestamp(),
            parent_hash: node.parent_hash().to_string(),
            children_count: node.children_hashes().len(),
            metadata: node.metadata().clone(),
        }
    }
}

impl HashChain {
    /// Exports the chain with its current Merkle root and convergence stamp.
    pub fn export(&self) -> ChainExport {
        ChainExport {
            version: EXPORT_VERSION.to_string(),
            root_seed: self.root_seed().to_string(),
            root_hash: self.root_hash().to_string(),
            merkle_root: self.compute_merkle_root(),
            convergence_hash: self
                .compute_convergence_hash(DEFAULT_CONVERGENCE_ITERATIONS)
                .to_string(),
            chain_length: self.len(),
            max_depth: self.max_depth().unwrap_or(0),
            nodes: self.nodes().iter().map(NodeSummary::from).collect(),
            exported_at: Utc::now(),
        }
    }

    /// Rebuilds a chain from an export.
    ///
    /// Each node's identity hash is recomputed and must match the recorded
    /// one; children are re-derived from parent linkage and must match the
    /// recorded counts. Dangling parents are accepted here and reported by
    /// [`verify_integrity`](HashChain::verify_integrity).
    pub fn import(data: &ChainExport) -> ChainResult<Self> {
        let expected_root = sha256_hex(&data.root_seed);
        if expected_root != data.root_hash {
            return Err(ChainError::RootMismatch {
                expected: expected_root,
                found: data.root_hash.clone(),
            });
        }

        let mut chain = HashChain::new(data.root_seed.clone());
        for (index, summary) in data.nodes.iter().enumerate() {
            let node = HashNode::new(
                summary.data_hash.clone(),
                summary.depth,
                summary.timestamp,
                summary.parent_hash.clone(),
                summary.metadata.clone(),
            );
            if node.identity_hash() != summary.identity_hash {
                return Err(ChainError::HashMismatch {
                    index,
                    recorded: summary.identity_hash.clone(),
                    computed: node.identity_hash().to_string(),
                });
            }
            if chain.contains(node.identity_hash()) {
                return Err(ChainError::DuplicateNode(summary.identity_hash.clone()));
            }
            chain.push(node);
        }

        chain.relink_children();
        for (index, (node, summary)) in chain.nodes().iter().zip(&data.nodes).enumerate() {
            let found = node.children_hashes().len();
            if found != summary.children_count {
                return Err(ChainError::ChildrenMismatch {
                    index,
                    expected: summary.children_count,
                    found,
                });
            }
        }
        Ok(chain)
    }

    /// Serializes [`export`](Self::export) as JSON.
    pub fn to_json(&self) -> ChainResult<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Parses a JSON export and [`import`](Self::import)s it.
    pub fn from_json(json: &str) -> ChainResult<Self> {
        let data: ChainExport = serde_json::from_str(json)?;
        Self::import(&data)
    }
}
