//! collab-transport: framed, ordered message delivery between a client and
//! a room peer, with reconnection, queueing and heartbeats.
//!
//! Two capability variants implement [`Transport`]:
//! - [`websocket::WebSocketTransport`] — the networked default.
//! - [`broadcast::BroadcastTransport`] — same-origin, in-process delivery
//!   with no reconnect or heartbeat machinery.

pub mod backoff;
pub mod broadcast;
pub mod config;
pub mod envelope;
pub mod error;
pub mod events;
pub mod queue;
pub mod transport;
pub mod websocket;

pub use broadcast::{BroadcastHub, BroadcastTransport};
pub use config::TransportConfig;
pub use envelope::{Envelope, MessageType};
pub use error::{Result, TransportError};
pub use events::{EventEmitter, TransportEvent, Unsubscribe};
pub use transport::Transport;
pub use websocket::WebSocketTransport;
