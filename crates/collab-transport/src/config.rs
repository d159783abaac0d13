//! Configuration for transport instances.

use std::time::Duration;

/// Configuration for a [`crate::Transport`].
///
/// Mirrors the option table in the collab wire spec; all fields have the
/// documented defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportConfig {
    /// Enable automatic reconnect with exponential backoff.
    pub reconnect: bool,
    /// Base backoff duration; actual delay is `reconnect_delay * 2^(attempt-1)`.
    pub reconnect_delay: Duration,
    /// Maximum consecutive reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,
    /// Period between outbound heartbeat pings while connected.
    pub ping_interval: Duration,
    /// Maximum number of outbound messages queued while disconnected.
    pub message_queue_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            reconnect: true,
            reconnect_delay: Duration::from_millis(1000),
            max_reconnect_attempts: 10,
            ping_interval: Duration::from_secs(30),
            message_queue_size: 100,
        }
    }
}

impl TransportConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, max: u32) -> Self {
        self.max_reconnect_attempts = max;
        self
    }

    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    #[must_use]
    pub fn with_message_queue_size(mut self, size: usize) -> Self {
        self.message_queue_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = TransportConfig::default();
        assert!(config.reconnect);
        assert_eq!(config.reconnect_delay, Duration::from_millis(1000));
        assert_eq!(config.max_reconnect_attempts, 10);
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.message_queue_size, 100);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = TransportConfig::new()
            .with_reconnect(false)
            .with_max_reconnect_attempts(3)
            .with_message_queue_size(5);
        assert!(!config.reconnect);
        assert_eq!(config.max_reconnect_attempts, 3);
        assert_eq!(config.message_queue_size, 5);
    }
}
