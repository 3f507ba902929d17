//! The append-only chain and its indices.

use crate::error::{ChainError, ChainResult};
use crate::merkle::{self, ConvergenceStamp};
use crate::node::HashNode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use statesync_types::hash::hash_value;
use statesync_types::{sha256_hex, unix_now};
use std::collections::{BTreeMap, HashMap};

/// Step used to keep auto-assigned timestamps strictly increasing.
const TIMESTAMP_STEP: f64 = 1e-6;

/// Outcome of [`HashChain::verify_integrity`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// One human-readable message per violation.
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns true if no violations were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Append-only, depth-indexed tree of content hashes.
///
/// Nodes live in an arena (`chain`) in creation order; `depth_map` and
/// `hash_index` hold positions into it. Only `add_node` and import mutate
/// the indices.
#[derive(Debug, Clone)]
pub struct HashChain {
    root_seed: String,
    root_hash: String,
    chain: Vec<HashNode>,
    depth_map: BTreeMap<usize, Vec<usize>>,
    hash_index: HashMap<String, usize>,
    last_timestamp: f64,
}

impl HashChain {
    /// Creates an empty chain whose root marker is `sha256(root_seed)`.
    pub fn new(root_seed: impl Into<String>) -> Self {
        let root_seed = root_seed.into();
        let root_hash = sha256_hex(&root_seed);
        Self {
            root_seed,
            root_hash,
            chain: Vec::new(),
            depth_map: BTreeMap::new(),
            hash_index: HashMap::new(),
            last_timestamp: f64::MIN,
        }
    }

    /// Seed the root marker was derived from.
    pub fn root_seed(&self) -> &str {
        &self.root_seed
    }

    /// The chain-root marker used as parent of depth-0 nodes.
    pub fn root_hash(&self) -> &str {
        &self.root_hash
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns true if no nodes have been added.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Deepest populated depth, if any.
    pub fn max_depth(&self) -> Option<usize> {
        self.depth_map.keys().next_back().copied()
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[HashNode] {
        &self.chain
    }

    /// Looks up a node by identity hash.
    pub fn get(&self, identity_hash: &str) -> Option<&HashNode> {
        self.hash_index.get(identity_hash).map(|&i| &self.chain[i])
    }

    /// Returns true if `identity_hash` is indexed.
    pub fn contains(&self, identity_hash: &str) -> bool {
        self.hash_index.contains_key(identity_hash)
    }

    /// Nodes at `depth`, in insertion order.
    pub fn nodes_at_depth(&self, depth: usize) -> impl Iterator<Item = &HashNode> {
        self.depth_map
            .get(&depth)
            .into_iter()
            .flatten()
            .map(|&i| &self.chain[i])
    }

    /// Appends a node for `payload`, stamped with the current time.
    ///
    /// Without a parent the node sits at depth 0 under the root marker.
    /// With a parent, the parent must already be indexed.
    pub fn add_node(
        &mut self,
        payload: &Value,
        parent: Option<&str>,
        metadata: BTreeMap<String, Value>,
    ) -> ChainResult<&HashNode> {
        let mut timestamp = unix_now();
        if timestamp <= self.last_timestamp {
            timestamp = self.last_timestamp + TIMESTAMP_STEP;
        }
        self.add_node_at(payload, parent, metadata, timestamp)
    }

    /// Appends a node with an explicit timestamp (for replay and tests).
    pub fn add_node_at(
        &mut self,
        payload: &Value,
        parent: Option<&str>,
        metadata: BTreeMap<String, Value>,
        timestamp: f64,
    ) -> ChainResult<&HashNode> {
        let (depth, parent_hash, parent_index) = match parent {
            None => (0, self.root_hash.clone(), None),
            Some(hash) => {
                let index = *self
                    .hash_index
                    .get(hash)
                    .ok_or_else(|| ChainError::UnknownParent(hash.to_string()))?;
                (self.chain[index].depth() + 1, hash.to_string(), Some(index))
            }
        };

        let node = HashNode::new(hash_value(payload), depth, timestamp, parent_hash, metadata);
        let identity = node.identity_hash().to_string();
        if self.hash_index.contains_key(&identity) {
            return Err(ChainError::DuplicateNode(identity));
        }

        if let Some(index) = parent_index {
            self.chain[index].push_child(identity.clone());
        }
        let index = self.push(node);
        self.last_timestamp = self.last_timestamp.max(timestamp);
        Ok(&self.chain[index])
    }

    /// Records the logical deletion of `target` as a child tombstone node.
    ///
    /// History is never removed; the tombstone is an ordinary node tagged
    /// with `tombstone: true`.
    pub fn add_tombstone(&mut self, target: &str, reason: &str) -> ChainResult<&HashNode> {
        let payload = json!({ "tombstone": target, "reason": reason });
        let metadata = BTreeMap::from([
            ("tombstone".to_string(), Value::Bool(true)),
            ("target".to_string(), Value::String(target.to_string())),
        ]);
        self.add_node(&payload, Some(target), metadata)
    }

    /// Merkle root over the subtree hashes of the deepest level.
    ///
    /// Leaf order is insertion order within that level. An empty chain
    /// yields the root marker.
    pub fn compute_merkle_root(&self) -> String {
        let leaves: Vec<String> = match self.max_depth() {
            Some(depth) => self.nodes_at_depth(depth).map(HashNode::infinity_hash).collect(),
            None => Vec::new(),
        };
        merkle::merkle_root(leaves).unwrap_or_else(|| self.root_hash.clone())
    }

    /// Derives the convergence stamp from the current Merkle root.
    pub fn compute_convergence_hash(&self, max_iterations: u32) -> ConvergenceStamp {
        ConvergenceStamp::search(&self.compute_merkle_root(), max_iterations)
    }

    /// Checks parent linkage of every node. Never repairs anything.
    ///
    /// A node is linked if its parent is the root marker or an indexed
    /// node; a node linked to an indexed parent must sit exactly one level
    /// below it.
    pub fn verify_integrity(&self) -> IntegrityReport {
        let mut errors = Vec::new();
        for (position, node) in self.chain.iter().enumerate() {
            if node.parent_hash() == self.root_hash {
                if node.depth() != 0 {
                    errors.push(format!(
                        "node {position} at depth {} is attached to the chain root",
                        node.depth()
                    ));
                }
                continue;
            }
            match self.get(node.parent_hash()) {
                None => errors.push(format!(
                    "node {position} at depth {} references missing parent {}",
                    node.depth(),
                    node.parent_hash()
                )),
                Some(parent) if parent.depth() + 1 != node.depth() => errors.push(format!(
                    "node {position} at depth {} has parent at depth {}",
                    node.depth(),
                    parent.depth()
                )),
                Some(_) => {}
            }
        }
        IntegrityReport { errors }
    }

    /// Appends an already-built node to the arena and indices.
    pub(crate) fn push(&mut self, node: HashNode) -> usize {
        let index = self.chain.len();
        self.depth_map.entry(node.depth()).or_default().push(index);
        self.hash_index.insert(node.identity_hash().to_string(), index);
        self.chain.push(node);
        index
    }

    /// Re-derives every node's children from parent linkage.
    pub(crate) fn relink_children(&mut self) {
        let links: Vec<(usize, String)> = self
            .chain
            .iter()
            .filter_map(|node| {
                self.hash_index
                    .get(node.parent_hash())
                    .map(|&parent| (parent, node.identity_hash().to_string()))
            })
            .collect();
        for (parent, child) in links {
            self.chain[parent].push_child(child);
        }
        self.last_timestamp = self
            .chain
            .iter()
            .map(HashNode::timestamp)
            .fold(f64::MIN, f64::max);
    }
}

impl Default for HashChain {
    fn default() -> Self {
        Self::new(format!("statesync:{}", unix_now()))
    }
}
