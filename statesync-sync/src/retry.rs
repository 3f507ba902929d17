//! Bounded retry with a fixed backoff sequence.

use crate::cancel::CancelToken;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How often, and how patiently, an adapter call is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Vec<Duration>,
    attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Creates a policy. At least one attempt is always made.
    pub fn new(attempts: u32, backoff: Vec<Duration>, attempt_timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
            attempt_timeout,
        }
    }

    /// Builds the policy described by `config`.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.retry_attempts,
            config
                .retry_backoff_ms
                .iter()
                .copied()
                .map(Duration::from_millis)
                .collect(),
            config.attempt_timeout(),
        )
    }

    /// Maximum number of invocations.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait after the failed attempt with zero-based index `attempt`.
    ///
    /// Clamped to the last backoff value once the sequence is exhausted;
    /// an empty sequence means no wait.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let index = (attempt as usize).min(self.backoff.len().saturating_sub(1));
        self.backoff.get(index).copied().unwrap_or(Duration::ZERO)
    }

    /// Runs `op` until it yields a value `accept` approves.
    ///
    /// Each invocation is bounded by the per-attempt timeout. An `Err`, a
    /// timeout, or a rejected value counts as a failed attempt. Waits only
    /// between attempts. Returns `Ok(None)` once every attempt has failed
    /// and `Err(Cancelled)` as soon as `cancel` fires.
    pub async fn run<T, F, Fut, A>(
        &self,
        what: &str,
        cancel: &CancelToken,
        mut op: F,
        accept: A,
    ) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        A: Fn(&T) -> bool,
    {
        for attempt in 0..self.attempts {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                outcome = tokio::time::timeout(self.attempt_timeout, op()) => outcome,
            };

            let n = attempt + 1;
            match outcome {
                Ok(Ok(value)) if accept(&value) => return Ok(Some(value)),
                Ok(Ok(_)) => debug!("{what}: attempt {n}/{} rejected", self.attempts),
                Ok(Err(e)) => warn!("{what}: attempt {n}/{} failed: {e}", self.attempts),
                Err(_) => warn!(
                    "{what}: attempt {n}/{} timed out after {:?}",
                    self.attempts, self.attempt_timeout
                ),
            }

            if n < self.attempts {
                let delay = self.delay_for(attempt);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
        warn!("{what}: giving up after {} attempts", self.attempts);
        Ok(None)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}
