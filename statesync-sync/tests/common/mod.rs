#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use statesync_sync::{MemoryAdapter, PlatformAdapter, Result, StateEntry, SyncConfig, SyncError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn data(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

pub fn card(id: &str, pairs: &[(&str, Value)], created_at: f64, updated_at: f64) -> StateEntry {
    StateEntry::with_timestamps(id, "kanban_card", data(pairs), created_at, updated_at)
}

/// Config with millisecond backoff for tests that run on real time.
pub fn fast_config() -> SyncConfig {
    SyncConfig {
        retry_backoff_ms: vec![1, 2],
        attempt_timeout_ms: 1_000,
        ..SyncConfig::default()
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Memory adapter with scripted failures and call counters.
pub struct FlakyAdapter {
    pub inner: MemoryAdapter,
    put_failures: AtomicU32,
    get_failures: AtomicU32,
    list_failures: AtomicU32,
    raise: bool,
    broken_health: bool,
    put_delay: Duration,
    put_calls: AtomicU32,
    get_calls: AtomicU32,
}

impl FlakyAdapter {
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    pub fn with_entries(entries: Vec<StateEntry>) -> Self {
        Self {
            inner: MemoryAdapter::with_entries(entries),
            put_failures: AtomicU32::new(0),
            get_failures: AtomicU32::new(0),
            list_failures: AtomicU32::new(0),
            raise: false,
            broken_health: false,
            put_delay: Duration::ZERO,
            put_calls: AtomicU32::new(0),
            get_calls: AtomicU32::new(0),
        }
    }

    /// The next `n` puts fail (`u32::MAX` for always).
    pub fn fail_puts(self, n: u32) -> Self {
        self.put_failures.store(n, Ordering::SeqCst);
        self
    }

    /// The next `n` gets raise.
    pub fn fail_gets(self, n: u32) -> Self {
        self.get_failures.store(n, Ordering::SeqCst);
        self
    }

    /// The next `n` lists raise.
    pub fn fail_lists(self, n: u32) -> Self {
        self.list_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Failed puts raise instead of returning false.
    pub fn raising(mut self) -> Self {
        self.raise = true;
        self
    }

    pub fn broken_health(mut self) -> Self {
        self.broken_health = true;
        self
    }

    /// Every put takes `delay` before doing anything.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.put_delay = delay;
        self
    }

    pub fn put_calls(&self) -> u32 {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformAdapter for FlakyAdapter {
    async fn get(&self, id: &str) -> Result<Option<StateEntry>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.get_failures) {
            return Err(SyncError::adapter("flaky", "simulated read failure"));
        }
        self.inner.get(id).await
    }

    async fn put(&self, entry: &StateEntry) -> Result<bool> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if !self.put_delay.is_zero() {
            tokio::time::sleep(self.put_delay).await;
        }
        if take_one(&self.put_failures) {
            if self.raise {
                return Err(SyncError::adapter("flaky", "simulated outage"));
            }
            return Ok(false);
        }
        self.inner.put(entry).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.inner.delete(id).await
    }

    async fn list(&self, entry_type: Option<&str>) -> Result<Vec<StateEntry>> {
        if take_one(&self.list_failures) {
            return Err(SyncError::adapter("flaky", "simulated list failure"));
        }
        self.inner.list(entry_type).await
    }

    async fn health_check(&self) -> Result<bool> {
        if self.broken_health {
            return Err(SyncError::adapter("flaky", "probe exploded"));
        }
        self.inner.health_check().await
    }
}
