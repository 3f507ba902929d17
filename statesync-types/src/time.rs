//! Wall-clock helpers.
//!
//! Entry and chain timestamps are seconds since the Unix epoch with
//! sub-second precision.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in seconds since the Unix epoch.
///
/// A clock set before the epoch reads as `0.0`.
#[must_use]
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
