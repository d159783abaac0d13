//! A single client's ephemeral state (§3 "Awareness State").

use collab_common::ClientId;
use serde::{Deserialize, Serialize};

/// Per-client ephemeral state. Ties on `clock` cannot happen for a single
/// client (it only ever increases locally), but across clients only the
/// `(clientId, clock)` pair that's highest for that client is retained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AwarenessState {
    pub client_id: ClientId,
    pub clock: u64,
    pub state: serde_json::Value,
    pub timestamp: u64,
}

impl AwarenessState {
    #[must_use]
    pub fn new(client_id: ClientId, clock: u64, state: serde_json::Value, timestamp: u64) -> Self {
        AwarenessState { client_id, clock, state, timestamp }
    }
}

/// Notifications fired to `Awareness` subscribers.
#[derive(Clone, Debug)]
pub enum AwarenessEvent {
    /// A remote entry was inserted or updated (including the initial
    /// snapshot delivered on subscribe).
    Updated(AwarenessState),
    /// A remote entry aged out via GC, or its client disconnected.
    Removed(ClientId),
}
