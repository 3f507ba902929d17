//! The versioned record moved between backing stores.
//!
//! An entry's `hash` covers `{id, type, data, version}` in canonical form.
//! Timestamps and `synced_at` bookkeeping are deliberately outside the hash:
//! two stores holding the same content at different sync times still
//! compare equal.

use crate::hash::hash_value;
use crate::{Error, Platform, Result, unix_now};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A versioned, typed, hashed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Stable external identifier, unique within a type namespace.
    pub id: String,
    /// Type tag used for filtered listing (e.g. `kanban_card`, `pr`).
    #[serde(rename = "type")]
    pub entry_type: String,
    /// The payload, keyed by field name.
    pub data: BTreeMap<String, Value>,
    /// Content hash of `{id, type, data, version}`.
    pub hash: String,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: f64,
    /// Last modification time; never earlier than `created_at`.
    pub updated_at: f64,
    /// Last successful sync time per platform.
    #[serde(default)]
    pub synced_at: BTreeMap<Platform, f64>,
    /// Starts at 1 and increases on every merge.
    pub version: u64,
}

impl StateEntry {
    /// Creates a version-1 entry stamped with the current time and hashed.
    pub fn new(
        id: impl Into<String>,
        entry_type: impl Into<String>,
        data: BTreeMap<String, Value>,
    ) -> Self {
        let now = unix_now();
        Self::with_timestamps(id, entry_type, data, now, now)
    }

    /// Creates a version-1 entry with explicit timestamps (for import or replay).
    ///
    /// `updated_at` is raised to `created_at` if it would be earlier.
    pub fn with_timestamps(
        id: impl Into<String>,
        entry_type: impl Into<String>,
        data: BTreeMap<String, Value>,
        created_at: f64,
        updated_at: f64,
    ) -> Self {
        let mut entry = Self {
            id: id.into(),
            entry_type: entry_type.into(),
            data,
            hash: String::new(),
            created_at,
            updated_at: updated_at.max(created_at),
            synced_at: BTreeMap::new(),
            version: 1,
        };
        entry.rehash();
        entry
    }

    /// Returns the entry with the given version and a recomputed hash.
    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version.max(1);
        self.rehash();
        self
    }

    /// Computes the content hash over `{id, type, data, version}`.
    pub fn compute_hash(&self) -> String {
        let data: Map<String, Value> = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut content = Map::new();
        content.insert("id".to_string(), Value::String(self.id.clone()));
        content.insert("type".to_string(), Value::String(self.entry_type.clone()));
        content.insert("data".to_string(), Value::Object(data));
        content.insert("version".to_string(), Value::from(self.version));

        hash_value(&Value::Object(content))
    }

    /// Recomputes and stores the content hash.
    pub fn rehash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Returns true if the stored hash matches the content.
    pub fn validate(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Like [`validate`](Self::validate), but reports the mismatch.
    pub fn ensure_valid(&self) -> Result<()> {
        let computed = self.compute_hash();
        if self.hash == computed {
            Ok(())
        } else {
            Err(Error::HashMismatch {
                id: self.id.clone(),
                stored: self.hash.clone(),
                computed,
            })
        }
    }

    /// Records a successful sync to `platform`.
    ///
    /// A platform's sync time never moves backwards.
    pub fn mark_synced(&mut self, platform: &Platform, at: f64) {
        let slot = self.synced_at.entry(platform.clone()).or_insert(at);
        if at > *slot {
            *slot = at;
        }
    }

    /// Returns true if a sync to `platform` has been recorded.
    pub fn is_synced_to(&self, platform: &Platform) -> bool {
        self.synced_at.contains_key(platform)
    }

    /// Serializes the entry as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parses an entry from JSON bytes. The hash is not checked.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
