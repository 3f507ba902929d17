//! Pre/post sync hooks.

use crate::error::Result;
use crate::report::SyncResult;
use async_trait::async_trait;
use statesync_types::Platform;

/// Observer invoked around every sync run.
///
/// Hook errors are logged by the engine and never abort a run.
#[async_trait]
pub trait SyncHook: Send + Sync {
    /// Called after targets are validated, before the source is listed.
    async fn before_sync(&self, _source: &Platform, _targets: &[Platform]) -> Result<()> {
        Ok(())
    }

    /// Called with every target's result once the run is over.
    async fn after_sync(&self, _results: &[SyncResult]) -> Result<()> {
        Ok(())
    }
}
