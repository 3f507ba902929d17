//! Sync engine: moves entries from one source to N targets.
//!
//! A run lists the source once, then makes one pass per target. Within a
//! pass entries are handled one at a time: fetch the target copy, create
//! or resolve or skip, write with retry. Passes share no mutable state
//! apart from the conflict queue and the optional attestation chain, both
//! behind locks, so they may run concurrently.

use crate::adapter::PlatformAdapter;
use crate::attest::{self, SharedChain};
use crate::cancel::CancelToken;
use crate::config::SyncConfig;
use crate::conflicts::{ConflictQueue, PendingConflict};
use crate::error::{Result, SyncError};
use crate::hooks::SyncHook;
use crate::report::{ConflictRecord, EntryDigest, SyncResult};
use crate::resolution::ManualResolution;
use crate::retry::RetryPolicy;
use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;
use statesync_types::{Platform, RunId, StateEntry, unix_now};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Parameters of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub source: Platform,
    pub targets: Vec<Platform>,
    /// Only sync entries of this type.
    pub entry_type: Option<String>,
    /// Resolve even when hashes already match.
    pub force: bool,
}

impl SyncRequest {
    pub fn new<P: Into<Platform>>(
        source: impl Into<Platform>,
        targets: impl IntoIterator<Item = P>,
    ) -> Self {
        Self {
            source: source.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            entry_type: None,
            force: false,
        }
    }

    #[must_use]
    pub fn entry_type(mut self, entry_type: impl Into<String>) -> Self {
        self.entry_type = Some(entry_type.into());
        self
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Orchestrates sync runs across registered platform adapters.
pub struct SyncEngine {
    config: SyncConfig,
    retry: RetryPolicy,
    adapters: BTreeMap<Platform, Arc<dyn PlatformAdapter>>,
    hooks: Vec<Arc<dyn SyncHook>>,
    conflicts: Arc<RwLock<ConflictQueue>>,
    attestation: Option<SharedChain>,
}

impl SyncEngine {
    /// Creates an engine with no adapters registered.
    pub fn new(config: SyncConfig) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            config,
            retry,
            adapters: BTreeMap::new(),
            hooks: Vec::new(),
            conflicts: Arc::new(RwLock::new(ConflictQueue::default())),
            attestation: None,
        }
    }

    /// Registers the adapter for `platform`, replacing any previous one.
    #[must_use]
    pub fn with_adapter(
        mut self,
        platform: impl Into<Platform>,
        adapter: Arc<dyn PlatformAdapter>,
    ) -> Self {
        self.adapters.insert(platform.into(), adapter);
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn SyncHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Records every finished run (and every manual resolution) in `chain`.
    #[must_use]
    pub fn with_attestation(mut self, chain: SharedChain) -> Self {
        self.attestation = Some(chain);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Registered platform names, in order.
    pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
        self.adapters.keys()
    }

    pub fn attestation_chain(&self) -> Option<&SharedChain> {
        self.attestation.as_ref()
    }

    fn adapter(&self, platform: &Platform) -> Result<&Arc<dyn PlatformAdapter>> {
        self.adapters
            .get(platform)
            .ok_or_else(|| SyncError::UnknownPlatform(platform.to_string()))
    }

    // ── Sync runs ────────────────────────────────────────────────

    /// Runs a sync to completion.
    pub async fn sync(&self, request: &SyncRequest) -> Result<Vec<SyncResult>> {
        self.sync_cancellable(request, &CancelToken::never()).await
    }

    /// Runs a sync that stops early when `cancel` fires.
    ///
    /// Returns `Err` only for unknown platforms. Everything else, including
    /// a source that cannot be listed, is reported in the per-target
    /// results. The source itself is never a target.
    pub async fn sync_cancellable(
        &self,
        request: &SyncRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<SyncResult>> {
        let source = self.adapter(&request.source)?;
        let mut targets = Vec::with_capacity(request.targets.len());
        for target in &request.targets {
            let adapter = self.adapter(target)?;
            if *target == request.source {
                debug!("Skipping target {} (same as source)", target);
            } else if !targets.iter().any(|(t, _)| *t == target) {
                targets.push((target, Arc::as_ref(adapter)));
            }
        }

        let run_id = RunId::new();
        let target_names: Vec<Platform> = targets.iter().map(|(t, _)| (*t).clone()).collect();
        info!(
            "Sync run {} started: {} -> {:?}",
            run_id, request.source, target_names
        );
        for hook in &self.hooks {
            if let Err(e) = hook.before_sync(&request.source, &target_names).await {
                warn!("before_sync hook failed: {e}");
            }
        }

        let started = Instant::now();
        let listing = self
            .retry
            .run(
                &format!("list {}", request.source),
                cancel,
                || source.list(request.entry_type.as_deref()),
                |_| true,
            )
            .await;

        let results = match listing {
            Ok(Some(entries)) => {
                debug!("Listed {} entries from {}", entries.len(), request.source);
                let passes = targets.iter().map(|(target, adapter)| {
                    self.sync_target(run_id, request, target, *adapter, &entries, cancel)
                });
                if self.config.parallel_targets {
                    join_all(passes).await
                } else {
                    let mut results = Vec::with_capacity(targets.len());
                    for pass in passes {
                        results.push(pass.await);
                    }
                    results
                }
            }
            other => {
                let (message, cancelled) = match other {
                    Err(SyncError::Cancelled) => ("sync cancelled".to_string(), true),
                    Err(e) => (e.to_string(), false),
                    Ok(_) => (
                        format!("failed to list entries from {}", request.source),
                        false,
                    ),
                };
                error!("Sync run {} aborted: {}", run_id, message);
                targets
                    .iter()
                    .map(|(target, _)| {
                        let mut result =
                            SyncResult::new(run_id, request.source.clone(), (*target).clone());
                        result.error = Some(message.clone());
                        result.cancelled = cancelled;
                        result.finish(started);
                        result
                    })
                    .collect()
            }
        };

        for hook in &self.hooks {
            if let Err(e) = hook.after_sync(&results).await {
                warn!("after_sync hook failed: {e}");
            }
        }
        if let Some(chain) = &self.attestation {
            match attest::attest_report(chain, &results).await {
                Ok(hash) => debug!("Attested run {} as {}", run_id, hash),
                Err(e) => warn!("Failed to attest run {}: {e}", run_id),
            }
        }

        let synced: usize = results.iter().map(|r| r.entries_synced).sum();
        let failed: usize = results.iter().map(|r| r.entries_failed).sum();
        info!(
            "Sync run {} finished: {} synced, {} failed",
            run_id, synced, failed
        );
        Ok(results)
    }

    async fn sync_target(
        &self,
        run_id: RunId,
        request: &SyncRequest,
        target: &Platform,
        adapter: &dyn PlatformAdapter,
        entries: &[StateEntry],
        cancel: &CancelToken,
    ) -> SyncResult {
        let started = Instant::now();
        let mut result = SyncResult::new(run_id, request.source.clone(), target.clone());

        for (index, entry) in entries.iter().enumerate() {
            let outcome = if cancel.is_cancelled() {
                Err(SyncError::Cancelled)
            } else {
                self.sync_entry(request, target, adapter, entry, &mut result, cancel)
                    .await
            };
            if let Err(e) = outcome {
                let remaining = entries.len() - index;
                result.entries_failed += remaining;
                if matches!(e, SyncError::Cancelled) {
                    warn!(
                        "Sync to {} cancelled with {} entries outstanding",
                        target, remaining
                    );
                    result.cancelled = true;
                } else {
                    error!("Sync to {} aborted at {}: {e}", target, entry.id);
                    result.error = Some(e.to_string());
                }
                break;
            }
        }

        result.finish(started);
        info!(
            "Synced {} -> {}: {} synced, {} skipped, {} failed, {} conflicts",
            request.source,
            target,
            result.entries_synced,
            result.entries_skipped,
            result.entries_failed,
            result.conflicts.len()
        );
        result
    }

    /// Handles one entry against one target, recording the outcome in
    /// `result`. Only cancellation escapes as `Err`.
    async fn sync_entry(
        &self,
        request: &SyncRequest,
        target: &Platform,
        adapter: &dyn PlatformAdapter,
        entry: &StateEntry,
        result: &mut SyncResult,
        cancel: &CancelToken,
    ) -> Result<()> {
        if let Err(e) = entry.ensure_valid() {
            warn!("Not syncing corrupt source entry {}: {e}", entry.id);
            result.integrity_errors.push(format!("{}: {e}", request.source));
            result.entries_failed += 1;
            return Ok(());
        }

        let Some(existing) = self
            .retry
            .run(
                &format!("get {} from {}", entry.id, target),
                cancel,
                || adapter.get(&entry.id),
                |_| true,
            )
            .await?
        else {
            result.entries_failed += 1;
            return Ok(());
        };

        let now = unix_now();
        let mut resolved = match existing {
            None => entry.clone(),
            Some(existing) => {
                let corrupt = match existing.ensure_valid() {
                    Ok(()) => false,
                    Err(e) => {
                        warn!("Target {} holds a corrupt copy of {}", target, entry.id);
                        result.integrity_errors.push(format!("{target}: {e}"));
                        true
                    }
                };
                if !request.force && !corrupt && existing.hash == entry.hash {
                    result.entries_skipped += 1;
                    self.conflicts.write().await.remove(target, &entry.id);
                    return Ok(());
                }
                // A corrupt copy never takes part in resolution.
                if corrupt {
                    entry.clone()
                } else {
                    match self.config.resolution.resolve(entry, &existing, now) {
                        Some(resolved) => resolved,
                        None => {
                            warn!("Unresolved conflict for {} on {}", entry.id, target);
                            result.conflicts.push(ConflictRecord {
                                entry_id: entry.id.clone(),
                                source_hash: entry.hash.clone(),
                                target_hash: existing.hash.clone(),
                            });
                            self.conflicts.write().await.record(PendingConflict {
                                source: request.source.clone(),
                                target: target.clone(),
                                source_entry: entry.clone(),
                                target_entry: existing,
                                detected_at: Utc::now(),
                            });
                            return Ok(());
                        }
                    }
                }
            }
        };

        if let Err(e) = resolved.ensure_valid() {
            warn!("Refusing to write invalid resolution of {} to {}: {e}", entry.id, target);
            result.integrity_errors.push(format!("{target}: {e}"));
            result.entries_failed += 1;
            return Ok(());
        }

        resolved.mark_synced(target, now);
        if self.put_with_retry(target, adapter, &resolved, cancel).await? {
            result.entries_synced += 1;
            result.written.push(EntryDigest::from(&resolved));
            self.conflicts.write().await.remove(target, &entry.id);
        } else {
            result.entries_failed += 1;
        }
        Ok(())
    }

    async fn put_with_retry(
        &self,
        platform: &Platform,
        adapter: &dyn PlatformAdapter,
        entry: &StateEntry,
        cancel: &CancelToken,
    ) -> Result<bool> {
        let written = self
            .retry
            .run(
                &format!("put {} to {}", entry.id, platform),
                cancel,
                || adapter.put(entry),
                |accepted| *accepted,
            )
            .await?;
        Ok(written.is_some())
    }

    /// Writes `entry` to `platform` with the configured retry policy.
    ///
    /// Returns `Ok(false)` once every attempt returned false, raised, or
    /// timed out.
    pub async fn write_with_retry(&self, platform: &Platform, entry: &StateEntry) -> Result<bool> {
        let adapter = self.adapter(platform)?;
        self.put_with_retry(platform, Arc::as_ref(adapter), entry, &CancelToken::never())
            .await
    }

    // ── Entry convenience ────────────────────────────────────────

    /// Creates an entry on the primary platform, then on every other
    /// platform in `platforms` (default: all registered).
    ///
    /// Partial propagation is not an error: the returned entry's
    /// `synced_at` names exactly the platforms that accepted the write.
    pub async fn create_entry(
        &self,
        id: impl Into<String>,
        entry_type: impl Into<String>,
        data: BTreeMap<String, Value>,
        platforms: Option<&[Platform]>,
    ) -> Result<StateEntry> {
        let primary = &self.config.primary;
        let primary_adapter = self.adapter(primary)?;
        let others: Vec<Platform> = match platforms {
            Some(list) => list.to_vec(),
            None => self.adapters.keys().cloned().collect(),
        };
        let mut targets: Vec<(&Platform, &dyn PlatformAdapter)> =
            Vec::with_capacity(others.len());
        for platform in others.iter().filter(|p| *p != primary) {
            if targets.iter().any(|(seen, _)| *seen == platform) {
                continue;
            }
            targets.push((platform, Arc::as_ref(self.adapter(platform)?)));
        }
        let total = targets.len() + 1;

        let cancel = CancelToken::never();
        let mut entry = StateEntry::new(id, entry_type, data);

        let mut staged = entry.clone();
        staged.mark_synced(primary, unix_now());
        if self
            .put_with_retry(primary, Arc::as_ref(primary_adapter), &staged, &cancel)
            .await?
        {
            entry = staged;
        } else {
            warn!("Failed to create {} on primary {}", entry.id, primary);
        }

        for (platform, adapter) in targets {
            let mut staged = entry.clone();
            staged.mark_synced(platform, unix_now());
            if self
                .put_with_retry(platform, adapter, &staged, &cancel)
                .await?
            {
                entry = staged;
            } else {
                warn!("Failed to propagate {} to {}", entry.id, platform);
            }
        }

        info!(
            "Created {} on {} of {} platforms",
            entry.id,
            entry.synced_at.len(),
            total
        );
        Ok(entry)
    }

    /// Reads an entry from `platform`, or from the primary.
    pub async fn get_entry(&self, id: &str, platform: Option<&Platform>) -> Result<Option<StateEntry>> {
        let platform = platform.unwrap_or(&self.config.primary);
        let adapter = self.adapter(platform)?;
        tokio::time::timeout(self.config.attempt_timeout(), adapter.get(id))
            .await
            .map_err(|_| SyncError::Timeout)?
    }

    /// Probes every adapter. One platform failing never affects the others.
    pub async fn health_check_all(&self) -> BTreeMap<Platform, bool> {
        let timeout = self.config.attempt_timeout();
        let probes = self.adapters.iter().map(|(platform, adapter)| async move {
            let healthy = match tokio::time::timeout(timeout, adapter.health_check()).await {
                Ok(Ok(healthy)) => healthy,
                Ok(Err(e)) => {
                    warn!("Health check for {} failed: {e}", platform);
                    false
                }
                Err(_) => {
                    warn!("Health check for {} timed out", platform);
                    false
                }
            };
            (platform.clone(), healthy)
        });
        join_all(probes).await.into_iter().collect()
    }

    // ── Manual resolution ────────────────────────────────────────

    /// Conflicts left by the manual policy, ordered by target then id.
    pub async fn pending_conflicts(&self) -> Vec<PendingConflict> {
        self.conflicts.read().await.list()
    }

    /// Applies an operator decision to a pending conflict.
    ///
    /// The resolved entry is written with retry to both the source and the
    /// target. The conflict stays queued unless both writes succeed.
    pub async fn resolve_conflict(
        &self,
        target: &Platform,
        id: &str,
        resolution: ManualResolution,
    ) -> Result<StateEntry> {
        let pending = self
            .conflicts
            .read()
            .await
            .get(target, id)
            .cloned()
            .ok_or_else(|| SyncError::ConflictNotFound {
                target: target.to_string(),
                id: id.to_string(),
            })?;
        let source_adapter = self.adapter(&pending.source)?;
        let target_adapter = self.adapter(target)?;

        let now = unix_now();
        let mut resolved = resolution.apply(&pending.source_entry, &pending.target_entry, now);
        resolved.mark_synced(&pending.source, now);
        resolved.mark_synced(target, now);

        let cancel = CancelToken::never();
        let source_ok = self
            .put_with_retry(&pending.source, Arc::as_ref(source_adapter), &resolved, &cancel)
            .await?;
        let target_ok = self
            .put_with_retry(target, Arc::as_ref(target_adapter), &resolved, &cancel)
            .await?;
        if !source_ok {
            return Err(SyncError::WriteFailed {
                platform: pending.source.to_string(),
                id: id.to_string(),
            });
        }
        if !target_ok {
            return Err(SyncError::WriteFailed {
                platform: target.to_string(),
                id: id.to_string(),
            });
        }

        self.conflicts.write().await.remove(target, id);
        info!(
            "Resolved conflict for {} between {} and {} ({:?})",
            id, pending.source, target, resolution
        );
        if let Some(chain) = &self.attestation {
            let attested = attest::attest_entries(chain, std::slice::from_ref(&resolved), None).await;
            if let Err(e) = attested {
                warn!("Failed to attest resolution of {}: {e}", id);
            }
        }
        Ok(resolved)
    }
}
