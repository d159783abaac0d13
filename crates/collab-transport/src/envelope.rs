//! The wire envelope shared by every message a [`crate::Transport`] exchanges.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Discriminates the payload carried by an [`Envelope`].
///
/// `Pong` is never surfaced as a `message` event; the transport consumes it
/// internally to track liveness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Sync,
    Awareness,
    Presence,
    Cursor,
    Operation,
    Ack,
    Error,
    Ping,
    Pong,
}

impl MessageType {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Sync => "sync",
            MessageType::Awareness => "awareness",
            MessageType::Presence => "presence",
            MessageType::Cursor => "cursor",
            MessageType::Operation => "operation",
            MessageType::Ack => "ack",
            MessageType::Error => "error",
            MessageType::Ping => "ping",
            MessageType::Pong => "pong",
        }
    }
}

/// Self-contained message envelope carried over a transport session.
///
/// Serializes to a single JSON object; `version` is reserved for future wire
/// revisions and is omitted when absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub room_id: String,
    pub client_id: String,
    pub payload: serde_json::Value,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl Envelope {
    /// Build an envelope stamped with the current wall-clock time.
    #[must_use]
    pub fn new(
        message_type: MessageType,
        room_id: impl Into<String>,
        client_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Envelope {
            message_type,
            room_id: room_id.into(),
            client_id: client_id.into(),
            payload,
            timestamp: now_ms(),
            version: None,
        }
    }

    #[must_use]
    pub fn ping(room_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Envelope::new(MessageType::Ping, room_id, client_id, serde_json::Value::Null)
    }

    #[must_use]
    pub fn pong(room_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Envelope::new(MessageType::Pong, room_id, client_id, serde_json::Value::Null)
    }

    #[must_use]
    pub fn is_pong(&self) -> bool {
        self.message_type == MessageType::Pong
    }

    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_wire(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_format() {
        let env = Envelope::new(
            MessageType::Operation,
            "room-1",
            "client-a",
            serde_json::json!({"items": []}),
        );
        let wire = env.to_wire().unwrap();
        let back = Envelope::from_wire(&wire).unwrap();
        assert_eq!(back.room_id, "room-1");
        assert_eq!(back.client_id, "client-a");
        assert_eq!(back.message_type, MessageType::Operation);
        assert!(wire.contains("\"roomId\""));
        assert!(wire.contains("\"clientId\""));
    }

    #[test]
    fn pong_is_recognized() {
        let env = Envelope::pong("room", "client");
        assert!(env.is_pong());
    }

    #[test]
    fn message_type_serializes_lowercase() {
        let env = Envelope::ping("room", "client");
        let wire = env.to_wire().unwrap();
        assert!(wire.contains("\"type\":\"ping\""));
    }

    #[test]
    fn version_omitted_when_absent() {
        let env = Envelope::ping("room", "client");
        let wire = env.to_wire().unwrap();
        assert!(!wire.contains("\"version\""));
    }
}
