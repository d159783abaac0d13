//! Awareness timing configuration (§6 configuration table).

use std::time::Duration;

/// Tuning knobs for remote-entry garbage collection.
#[derive(Clone, Copy, Debug)]
pub struct AwarenessConfig {
    /// How long a remote entry may go unrefreshed before GC removes it.
    pub timeout: Duration,
    /// How often the GC sweep runs.
    pub gc_interval: Duration,
}

impl Default for AwarenessConfig {
    fn default() -> Self {
        AwarenessConfig {
            timeout: Duration::from_millis(30_000),
            gc_interval: Duration::from_millis(15_000),
        }
    }
}

impl AwarenessConfig {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_gc_interval(mut self, gc_interval: Duration) -> Self {
        self.gc_interval = gc_interval;
        self
    }
}
