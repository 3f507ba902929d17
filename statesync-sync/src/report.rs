//! Per-target results and the aggregated run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statesync_types::{Platform, RunId, StateEntry};
use std::collections::BTreeMap;
use tokio::time::Instant;

/// An entry pair the active policy declined to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub entry_id: String,
    pub source_hash: String,
    pub target_hash: String,
}

/// What was written to a target, for attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDigest {
    pub id: String,
    pub hash: String,
    pub version: u64,
}

impl From<&StateEntry> for EntryDigest {
    fn from(entry: &StateEntry) -> Self {
        Self {
            id: entry.id.clone(),
            hash: entry.hash.clone(),
            version: entry.version,
        }
    }
}

/// Outcome of one source → target pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub run_id: RunId,
    pub source: Platform,
    pub target: Platform,
    pub entries_synced: usize,
    pub entries_failed: usize,
    /// Entries already consistent on the target.
    pub entries_skipped: usize,
    /// Unresolved divergences. They do not affect `success`.
    pub conflicts: Vec<ConflictRecord>,
    /// Hash mismatches found on either side.
    pub integrity_errors: Vec<String>,
    pub written: Vec<EntryDigest>,
    /// Set when the pass could not run at all (e.g. source listing failed).
    pub error: Option<String>,
    pub cancelled: bool,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    /// True iff `entries_failed == 0`, `error` is `None` and the pass was not
    /// `cancelled`. Pending `conflicts` and skipped entries do not count
    /// against it; a corrupt entry does, since it is also counted as failed.
    pub success: bool,
}

impl SyncResult {
    /// Creates an empty result for a pass.
    pub fn new(run_id: RunId, source: Platform, target: Platform) -> Self {
        Self {
            run_id,
            source,
            target,
            entries_synced: 0,
            entries_failed: 0,
            entries_skipped: 0,
            conflicts: Vec::new(),
            integrity_errors: Vec::new(),
            written: Vec::new(),
            error: None,
            cancelled: false,
            duration_ms: 0,
            timestamp: Utc::now(),
            success: false,
        }
    }

    /// Stamps the duration and derives `success`.
    pub(crate) fn finish(&mut self, started: Instant) {
        self.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.success = self.entries_failed == 0 && self.error.is_none() && !self.cancelled;
    }
}

/// Per-target line of a [`SyncReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub success: bool,
    pub entries_synced: usize,
    pub entries_failed: usize,
    pub conflicts: usize,
    pub duration_ms: u64,
    pub cancelled: bool,
}

/// Aggregate view of one run across all targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Option<RunId>,
    pub timestamp: DateTime<Utc>,
    pub overall_success: bool,
    pub total_entries_synced: usize,
    pub total_entries_failed: usize,
    pub total_conflicts: usize,
    pub total_duration_ms: u64,
    pub results_by_target: BTreeMap<String, TargetSummary>,
}

impl SyncReport {
    /// Aggregates the results of a run. An empty run is successful.
    pub fn from_results(results: &[SyncResult]) -> Self {
        let results_by_target = results
            .iter()
            .map(|r| {
                let summary = TargetSummary {
                    success: r.success,
                    entries_synced: r.entries_synced,
                    entries_failed: r.entries_failed,
                    conflicts: r.conflicts.len(),
                    duration_ms: r.duration_ms,
                    cancelled: r.cancelled,
                };
                (r.target.to_string(), summary)
            })
            .collect();

        Self {
            run_id: results.first().map(|r| r.run_id),
            timestamp: Utc::now(),
            overall_success: results.iter().all(|r| r.success),
            total_entries_synced: results.iter().map(|r| r.entries_synced).sum(),
            total_entries_failed: results.iter().map(|r| r.entries_failed).sum(),
            total_conflicts: results.iter().map(|r| r.conflicts.len()).sum(),
            total_duration_ms: results.iter().map(|r| r.duration_ms).sum(),
            results_by_target,
        }
    }

    /// Serializes the report as pretty JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
