//! Queue of conflicts awaiting an operator decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statesync_types::{Platform, StateEntry};
use std::collections::BTreeMap;

/// A divergent pair left untouched by the manual policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConflict {
    pub source: Platform,
    pub target: Platform,
    pub source_entry: StateEntry,
    pub target_entry: StateEntry,
    pub detected_at: DateTime<Utc>,
}

impl PendingConflict {
    pub fn entry_id(&self) -> &str {
        &self.source_entry.id
    }
}

/// Pending conflicts keyed by `(target, entry id)`. A newer detection for
/// the same key replaces the older one.
#[derive(Debug, Default)]
pub(crate) struct ConflictQueue {
    pending: BTreeMap<(Platform, String), PendingConflict>,
}

impl ConflictQueue {
    pub(crate) fn record(&mut self, conflict: PendingConflict) {
        let key = (conflict.target.clone(), conflict.entry_id().to_string());
        self.pending.insert(key, conflict);
    }

    pub(crate) fn get(&self, target: &Platform, id: &str) -> Option<&PendingConflict> {
        self.pending.get(&(target.clone(), id.to_string()))
    }

    pub(crate) fn remove(&mut self, target: &Platform, id: &str) -> Option<PendingConflict> {
        self.pending.remove(&(target.clone(), id.to_string()))
    }

    pub(crate) fn list(&self) -> Vec<PendingConflict> {
        self.pending.values().cloned().collect()
    }
}
