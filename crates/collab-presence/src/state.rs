//! `UserPresence` and the wire update it travels in (§3, §6).

use collab_common::ClientId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Idle,
    Offline,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: CursorPosition,
    pub head: CursorPosition,
}

/// A user's identity and live activity status, shared with peers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserPresence {
    pub client_id: ClientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub name: String,
    pub color: String,
    pub status: PresenceStatus,
    pub last_seen: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// The `presence` envelope payload (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PresenceUpdate {
    Join { presence: UserPresence },
    Update { presence: UserPresence },
    Leave { presence: UserPresence },
    Heartbeat { presence: UserPresence },
}

impl UserPresence {
    /// A fresh presence with `status = online`, `lastSeen = now`, and a
    /// color derived from `client_id` (§4.5 "Color assignment").
    #[must_use]
    pub fn new(client_id: ClientId, name: impl Into<String>) -> Self {
        let color = collab_common::hsl_from_client_id(client_id.as_str());
        UserPresence {
            client_id,
            user_id: None,
            avatar: None,
            name: name.into(),
            color,
            status: PresenceStatus::Online,
            last_seen: collab_common::now_ms(),
            cursor: None,
            selection: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Override the derived color with one the caller supplied explicitly.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

impl PresenceUpdate {
    #[must_use]
    pub fn presence(&self) -> &UserPresence {
        match self {
            PresenceUpdate::Join { presence }
            | PresenceUpdate::Update { presence }
            | PresenceUpdate::Leave { presence }
            | PresenceUpdate::Heartbeat { presence } => presence,
        }
    }
}

/// Notifications fired to `PresenceManager` subscribers.
#[derive(Clone, Debug)]
pub enum PresenceEvent {
    Joined(UserPresence),
    Updated(UserPresence),
    Left(ClientId),
}
