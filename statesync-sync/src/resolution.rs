//! Conflict resolution policies.
//!
//! Every policy is a pure function of `(source, target)`. Only
//! [`merge_entries`] creates new content, and so only it bumps `version`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use statesync_types::StateEntry;
use std::collections::BTreeMap;

/// How divergent entries are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Greater `updated_at` wins; ties go to the source.
    #[default]
    LastWriteWins,
    /// Lesser `created_at` wins; ties go to the source.
    FirstWriteWins,
    /// Field-level merge, source fields win on collision.
    Merge,
    /// Never resolve; record the conflict for an operator.
    Manual,
}

impl ConflictResolution {
    /// Resolves a divergent pair. `None` means the pair is left untouched
    /// and reported as a conflict.
    pub fn resolve(self, source: &StateEntry, target: &StateEntry, now: f64) -> Option<StateEntry> {
        match self {
            Self::LastWriteWins => Some(if source.updated_at >= target.updated_at {
                source.clone()
            } else {
                target.clone()
            }),
            Self::FirstWriteWins => Some(if source.created_at <= target.created_at {
                source.clone()
            } else {
                target.clone()
            }),
            Self::Merge => Some(merge_entries(source, target, now)),
            Self::Manual => None,
        }
    }
}

/// Operator decision for a conflict left by the manual policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "data")]
pub enum ManualResolution {
    /// Keep the source copy as-is.
    KeepSource,
    /// Keep the target copy as-is.
    KeepTarget,
    /// Apply the merge policy.
    Merge,
    /// Replace the payload with operator-supplied data.
    Replace(BTreeMap<String, Value>),
}

impl ManualResolution {
    /// Builds the resolved entry for a conflicting pair.
    pub fn apply(&self, source: &StateEntry, target: &StateEntry, now: f64) -> StateEntry {
        match self {
            Self::KeepSource => source.clone(),
            Self::KeepTarget => target.clone(),
            Self::Merge => merge_entries(source, target, now),
            Self::Replace(data) => derive_entry(source, target, data.clone(), now),
        }
    }
}

/// Merges two copies of an entry.
///
/// `data` is the target's fields overlaid by the source's, `created_at`
/// the earlier of both, `synced_at` the union (latest time per platform),
/// `version` one past the larger of both, and the hash is recomputed.
pub fn merge_entries(source: &StateEntry, target: &StateEntry, now: f64) -> StateEntry {
    let mut data = target.data.clone();
    data.extend(source.data.iter().map(|(k, v)| (k.clone(), v.clone())));
    derive_entry(source, target, data, now)
}

fn derive_entry(
    source: &StateEntry,
    target: &StateEntry,
    data: BTreeMap<String, Value>,
    now: f64,
) -> StateEntry {
    let created_at = source.created_at.min(target.created_at);
    let mut merged = StateEntry {
        id: source.id.clone(),
        entry_type: source.entry_type.clone(),
        data,
        hash: String::new(),
        created_at,
        updated_at: now.max(created_at),
        synced_at: target.synced_at.clone(),
        version: source.version.max(target.version) + 1,
    };
    for (platform, at) in &source.synced_at {
        merged.mark_synced(platform, *at);
    }
    merged.rehash();
    merged
}
