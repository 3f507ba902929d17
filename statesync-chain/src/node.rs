//! A single node of the hash chain.

use serde_json::{Map, Value};
use statesync_types::{canonical_json, sha256_hex};
use std::collections::BTreeMap;

/// Separator between hashed components.
const FIELD_SEPARATOR: &str = "::";

/// A node in the hash chain.
///
/// Everything except `children_hashes` is fixed at creation. Children are
/// recorded by their identity hashes as they are appended.
#[derive(Debug, Clone, PartialEq)]
pub struct HashNode {
    data_hash: String,
    depth: usize,
    timestamp: f64,
    parent_hash: String,
    children_hashes: Vec<String>,
    metadata: BTreeMap<String, Value>,
    identity: String,
}

impl HashNode {
    /// Creates a node with no children.
    ///
    /// `parent_hash` is either the owning chain's root hash (for depth 0)
    /// or the identity hash of the parent node.
    pub fn new(
        data_hash: impl Into<String>,
        depth: usize,
        timestamp: f64,
        parent_hash: impl Into<String>,
        metadata: BTreeMap<String, Value>,
    ) -> Self {
        let mut node = Self {
            data_hash: data_hash.into(),
            depth,
            timestamp,
            parent_hash: parent_hash.into(),
            children_hashes: Vec::new(),
            metadata,
            identity: String::new(),
        };
        node.identity = sha256_hex(node.identity_material());
        node
    }

    /// Hash of the raw payload attached to this node.
    pub fn data_hash(&self) -> &str {
        &self.data_hash
    }

    /// Distance from the chain root; root-adjacent nodes have depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Creation time, seconds since the Unix epoch.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Identity hash of the parent, or the chain's root hash.
    pub fn parent_hash(&self) -> &str {
        &self.parent_hash
    }

    /// Identity hashes of the children appended so far, in append order.
    pub fn children_hashes(&self) -> &[String] {
        &self.children_hashes
    }

    /// Free-form tags (entity type, originating id, ...).
    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Stable hash over content and position. Used as the linkage key.
    pub fn identity_hash(&self) -> &str {
        &self.identity
    }

    /// Subtree attestation hash: the identity fields plus the sorted set of
    /// children. Changes whenever a child is appended.
    pub fn infinity_hash(&self) -> String {
        let mut children: Vec<&str> = self.children_hashes.iter().map(String::as_str).collect();
        children.sort_unstable();

        let components = [
            self.data_hash.clone(),
            self.depth.to_string(),
            self.timestamp.to_string(),
            self.parent_hash.clone(),
            children.join("|"),
            self.canonical_metadata(),
        ];
        sha256_hex(components.join(FIELD_SEPARATOR))
    }

    pub(crate) fn push_child(&mut self, child_identity: String) {
        self.children_hashes.push(child_identity);
    }

    fn identity_material(&self) -> String {
        [
            self.data_hash.clone(),
            self.depth.to_string(),
            self.timestamp.to_string(),
            self.parent_hash.clone(),
            self.canonical_metadata(),
        ]
        .join(FIELD_SEPARATOR)
    }

    fn canonical_metadata(&self) -> String {
        let map: Map<String, Value> = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        canonical_json(&Value::Object(map))
    }
}
