//! Error types for the collab transport layer.

use thiserror::Error;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while driving a [`crate::Transport`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("maximum reconnect attempts ({0}) exhausted")]
    ReconnectExhausted(u32),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("transport already closed")]
    Closed,
}

impl TransportError {
    /// Errors that are expected to clear up on their own via reconnect/backoff.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectFailed(_) | TransportError::WebSocket(_) | TransportError::NotConnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_failed_is_transient() {
        assert!(TransportError::ConnectFailed("refused".into()).is_transient());
    }

    #[test]
    fn reconnect_exhausted_is_not_transient() {
        assert!(!TransportError::ReconnectExhausted(10).is_transient());
    }
}
