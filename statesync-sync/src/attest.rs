//! Hash-chain attestation of entries and sync runs.
//!
//! The chain is shared between concurrent sync workers behind a single
//! `RwLock`: every `add_node` takes the write lock, and readers computing
//! a Merkle root or verifying integrity take the read lock, so they never
//! observe a chain mid-mutation.

use crate::report::{SyncReport, SyncResult};
use serde_json::{Value, json};
use statesync_chain::{ChainResult, HashChain};
use statesync_types::StateEntry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A hash chain shared by several writers.
pub type SharedChain = Arc<RwLock<HashChain>>;

/// Wraps a chain for shared use.
pub fn shared_chain(chain: HashChain) -> SharedChain {
    Arc::new(RwLock::new(chain))
}

fn tags(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn entry_payload(id: &str, entry_type: &str, hash: &str, version: u64) -> Value {
    json!({ "id": id, "type": entry_type, "hash": hash, "version": version })
}

/// Adds one node per entry under `parent` (or at depth 0).
///
/// Returns the identity hashes of the new nodes, in entry order. The batch
/// is added under one write lock.
pub async fn attest_entries(
    chain: &SharedChain,
    entries: &[StateEntry],
    parent: Option<&str>,
) -> ChainResult<Vec<String>> {
    let mut chain = chain.write().await;
    let mut hashes = Vec::with_capacity(entries.len());
    for entry in entries {
        let payload = entry_payload(&entry.id, &entry.entry_type, &entry.hash, entry.version);
        let metadata = tags(&[
            ("entity_type", Value::from(entry.entry_type.as_str())),
            ("entry_id", Value::from(entry.id.as_str())),
        ]);
        let node = chain.add_node(&payload, parent, metadata)?;
        hashes.push(node.identity_hash().to_string());
    }
    Ok(hashes)
}

/// Records a finished run: a report node at depth 0, one child per target
/// and one grandchild per entry written to that target.
///
/// Returns the identity hash of the report node.
pub async fn attest_report(chain: &SharedChain, results: &[SyncResult]) -> ChainResult<String> {
    let report = SyncReport::from_results(results);
    let run_id = report
        .run_id
        .map(|id| Value::from(id.to_string()))
        .unwrap_or(Value::Null);
    let payload = serde_json::to_value(&report)?;

    let mut chain = chain.write().await;
    let report_hash = chain
        .add_node(
            &payload,
            None,
            tags(&[("kind", Value::from("sync_report")), ("run_id", run_id)]),
        )?
        .identity_hash()
        .to_string();

    for result in results {
        let payload = json!({
            "source": result.source,
            "target": result.target,
            "entries_synced": result.entries_synced,
            "entries_failed": result.entries_failed,
            "conflicts": result.conflicts,
            "success": result.success,
        });
        let target_hash = chain
            .add_node(
                &payload,
                Some(&report_hash),
                tags(&[
                    ("kind", Value::from("sync_target")),
                    ("target", Value::from(result.target.as_str())),
                ]),
            )?
            .identity_hash()
            .to_string();

        for digest in &result.written {
            let payload = json!({ "id": digest.id, "hash": digest.hash, "version": digest.version });
            chain.add_node(
                &payload,
                Some(&target_hash),
                tags(&[
                    ("kind", Value::from("entry")),
                    ("entry_id", Value::from(digest.id.as_str())),
                ]),
            )?;
        }
    }
    Ok(report_hash)
}
