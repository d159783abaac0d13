//! The `Transport` capability: the single abstraction the collab core needs
//! over "some bidirectional, possibly-lossy byte stream". `WebSocketTransport`
//! and `BroadcastTransport` are the two variants behind it.

use crate::envelope::MessageType;
use crate::error::Result;
use crate::events::{TransportEvent, Unsubscribe};
use async_trait::async_trait;

/// Capability shared by every transport variant.
///
/// `connect` is the only suspension point in the collab core (§5); every
/// other method here is synchronous and non-blocking.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the session. Idempotent: calling it while already connected (or
    /// while a connect is already in flight) resolves once that session is
    /// open, without opening a second one.
    async fn connect(&self) -> Result<()>;

    /// Disable auto-reconnect and close the current session, flushing any
    /// reconnect timer. Safe to call when already disconnected.
    fn disconnect(&self);

    /// Enqueue or immediately write a message. Never blocks and never
    /// panics on a disconnected session — it queues instead.
    fn send(&self, message_type: MessageType, payload: serde_json::Value);

    /// Register a listener for `connect | disconnect | message | error |
    /// reconnecting`. Returns a handle that removes the listener on request.
    fn on(&self, handler: Box<dyn Fn(TransportEvent) + Send + Sync>) -> Unsubscribe;

    fn is_connected(&self) -> bool;
}
