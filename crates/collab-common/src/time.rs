//! Wall-clock helpers. Every timestamp in the collab wire spec (`timestamp`,
//! `lastSeen`, awareness GC) is milliseconds since the Unix epoch.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Saturates to `0` rather than panicking if the system clock is set before
/// the epoch; collaborative state should degrade, not crash, on a bad clock.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "system clock before unix epoch, saturating to 0");
            0
        })
}
