//! Exponential reconnect backoff, grounded in the same shape as an HTTP
//! client's retry policy but scoped to a single monotonically increasing
//! attempt counter.

use std::time::Duration;

/// Tracks reconnect attempts and computes the delay before the next one.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    base_delay: Duration,
    max_attempts: u32,
    attempts: u32,
}

/// What a caller should do after a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Wait this long, then try again; carries the 1-based attempt number.
    Retry { delay: Duration, attempt: u32 },
    /// `max_attempts` consecutive failures have been observed; stop.
    GiveUp,
}

impl ReconnectState {
    #[must_use]
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        ReconnectState {
            base_delay,
            max_attempts,
            attempts: 0,
        }
    }

    /// Reset the attempt counter; called on every successful open.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Advance the attempt counter and decide whether/how long to wait.
    pub fn next(&mut self) -> ReconnectDecision {
        if self.attempts >= self.max_attempts {
            return ReconnectDecision::GiveUp;
        }
        self.attempts += 1;
        let shift = self.attempts.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << shift);
        ReconnectDecision::Retry {
            delay,
            attempt: self.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_each_attempt() {
        let mut state = ReconnectState::new(Duration::from_millis(1000), 10);
        assert_eq!(
            state.next(),
            ReconnectDecision::Retry {
                delay: Duration::from_millis(1000),
                attempt: 1
            }
        );
        assert_eq!(
            state.next(),
            ReconnectDecision::Retry {
                delay: Duration::from_millis(2000),
                attempt: 2
            }
        );
        assert_eq!(
            state.next(),
            ReconnectDecision::Retry {
                delay: Duration::from_millis(4000),
                attempt: 3
            }
        );
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut state = ReconnectState::new(Duration::from_millis(10), 2);
        assert!(matches!(state.next(), ReconnectDecision::Retry { .. }));
        assert!(matches!(state.next(), ReconnectDecision::Retry { .. }));
        assert_eq!(state.next(), ReconnectDecision::GiveUp);
    }

    #[test]
    fn reset_restores_attempt_zero() {
        let mut state = ReconnectState::new(Duration::from_millis(10), 5);
        state.next();
        state.next();
        state.reset();
        assert_eq!(state.attempts(), 0);
    }
}
