//! Presence timing configuration (§6 configuration table).

use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct PresenceConfig {
    /// Inactivity threshold before local status flips `online -> idle`.
    pub idle_timeout: Duration,
    /// Period between outbound heartbeat updates, and the unit that "three
    /// missed intervals" (the remote-presence prune threshold) is counted in.
    pub heartbeat_interval: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        PresenceConfig {
            idle_timeout: Duration::from_millis(60_000),
            heartbeat_interval: Duration::from_millis(30_000),
        }
    }
}

impl PresenceConfig {
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }
}
