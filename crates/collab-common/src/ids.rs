//! `ClientId`, `Clock` and `ItemId` (§3 of the collab wire spec).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, process-unique identifier for a replica.
///
/// Newtype over `String` rather than a bare alias so that call sites can't
/// accidentally pass an arbitrary string where a client identity is meant.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// Generate a fresh, globally-unique id for a new replica.
    #[must_use]
    pub fn generate() -> Self {
        ClientId(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        ClientId(s.to_string())
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        ClientId(s)
    }
}

/// Monotonically non-decreasing counter scoped to a single [`ClientId`].
pub type Clock = u64;

/// `(ClientId, Clock)` pair that names a CRDT item for all time.
///
/// Totally ordered: first by `client` (lexicographic on the opaque string),
/// then by `clock`. This is the tie-break order used by the YATA integration
/// rule (§4.2) and by Map's last-writer-wins-by-id resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId {
    pub client: ClientId,
    pub clock: Clock,
}

impl ItemId {
    #[must_use]
    pub fn new(client: ClientId, clock: Clock) -> Self {
        ItemId { client, clock }
    }
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.client
            .cmp(&other.client)
            .then_with(|| self.clock.cmp(&other.clock))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_orders_by_client_then_clock() {
        let a = ItemId::new(ClientId::from("alice"), 5);
        let b = ItemId::new(ClientId::from("bob"), 0);
        assert!(a < b, "alice sorts before bob regardless of clock");

        let a0 = ItemId::new(ClientId::from("alice"), 0);
        let a1 = ItemId::new(ClientId::from("alice"), 1);
        assert!(a0 < a1);
    }

    #[test]
    fn generated_client_ids_are_unique() {
        let a = ClientId::generate();
        let b = ClientId::generate();
        assert_ne!(a, b);
    }
}
