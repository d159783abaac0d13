//! `CollabRoom`: the composition facade (§4.6).
//!
//! Owns one `ClientId`, one transport, one coordination model (CRDT or OT —
//! a room picks one per §4.3), one awareness set and one presence roster.
//! Wiring between them is entirely event-driven, matching the "composes via
//! events, no shared locking" design in §5.

use crate::cursor::{cursor_to_pixels, CursorDecoration, CursorPosition};
use crate::error::{Result, RoomError};
use crate::listeners::Listeners;
use crate::messages::SyncMessage;
use collab_awareness::{Awareness, AwarenessConfig, AwarenessState};
use collab_common::ClientId;
use collab_crdt::{Doc, Update};
use collab_ot::{OperationWithMeta, OtClient};
use collab_presence::{PresenceConfig, PresenceManager, PresenceUpdate, UserPresence};
use collab_transport::{Envelope, MessageType, Transport, TransportEvent};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Which coordination model backs the room's text document. A room does not
/// combine the two (§4.3 "O and C are not combined").
pub enum CoordinationModel {
    Crdt(Doc),
    Ot(OtClient),
}

impl CoordinationModel {
    fn mode_name(&self) -> &'static str {
        match self {
            CoordinationModel::Crdt(_) => "crdt",
            CoordinationModel::Ot(_) => "ot",
        }
    }
}

/// Notifications a host application subscribes to for everything the room
/// doesn't already expose through `collab-crdt`/`collab-ot` listeners.
#[derive(Clone, Debug)]
pub enum RoomEvent {
    Cursor(CursorDecoration),
    PresenceJoined(UserPresence),
    PresenceLeft(ClientId),
    Error(String),
}

/// Composition facade wiring one transport to the CRDT/OT, awareness and
/// presence components (§4.6).
pub struct CollabRoom {
    client_id: ClientId,
    room_id: String,
    transport: Arc<dyn Transport>,
    model: Mutex<CoordinationModel>,
    awareness: Awareness,
    presence: PresenceManager,
    listeners: Listeners<RoomEvent>,
    self_weak: Mutex<Weak<CollabRoom>>,
}

impl CollabRoom {
    /// Build a room. `local_presence` seeds the presence roster; its
    /// `client_id` must match `client_id`.
    #[must_use]
    pub fn new(
        client_id: ClientId,
        room_id: impl Into<String>,
        transport: Arc<dyn Transport>,
        model: CoordinationModel,
        awareness_config: AwarenessConfig,
        presence_config: PresenceConfig,
        local_presence: UserPresence,
    ) -> Arc<Self> {
        let room_id = room_id.into();

        // Wire local-mutation -> outbound send before the model moves behind
        // a mutex; `on_update`/`on_send` only need `&self`/`&Self`.
        match &model {
            CoordinationModel::Crdt(doc) => {
                let transport = Arc::clone(&transport);
                doc.on_update(move |update| {
                    if update.origin == collab_crdt::UpdateOrigin::Local {
                        let wire = Update::new(update.items.clone(), update.delete_set.clone());
                        if let Ok(payload) = serde_json::to_value(&wire) {
                            transport.send(MessageType::Operation, payload);
                        }
                    }
                });
            }
            CoordinationModel::Ot(client) => {
                let transport = Arc::clone(&transport);
                client.on_send(move |op| {
                    if let Ok(payload) = serde_json::to_value(&op) {
                        transport.send(MessageType::Operation, payload);
                    }
                });
            }
        }

        Arc::new_cyclic(|weak| CollabRoom {
            client_id,
            room_id,
            transport,
            model: Mutex::new(model),
            awareness: Awareness::new(ClientId::from(local_presence.client_id.as_str()), awareness_config),
            presence: PresenceManager::new(local_presence, presence_config),
            listeners: Listeners::new(),
            self_weak: Mutex::new(weak.clone()),
        })
    }

    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    #[must_use]
    pub fn awareness(&self) -> &Awareness {
        &self.awareness
    }

    #[must_use]
    pub fn presence(&self) -> &PresenceManager {
        &self.presence
    }

    pub fn subscribe<F>(&self, listener: F) -> u64
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        self.listeners.on(listener)
    }

    pub fn unsubscribe(&self, id: u64) {
        self.listeners.unsubscribe(id);
    }

    /// Run `f` against the room's document, if it is running in CRDT mode.
    /// `doc.on_update` (wired in [`CollabRoom::new`]) forwards whatever `f`
    /// mutates to the transport as an `operation` message, so this is the
    /// one seam a host needs to drive local edits through.
    pub fn with_doc<R>(&self, f: impl FnOnce(&mut Doc) -> R) -> Option<R> {
        match &mut *self.model.lock() {
            CoordinationModel::Crdt(doc) => Some(f(doc)),
            CoordinationModel::Ot(_) => None,
        }
    }

    /// Run `f` against the room's OT client, if it is running in OT mode.
    pub fn with_ot_client<R>(&self, f: impl FnOnce(&mut OtClient) -> R) -> Option<R> {
        match &mut *self.model.lock() {
            CoordinationModel::Ot(client) => Some(f(client)),
            CoordinationModel::Crdt(_) => None,
        }
    }

    /// Open the transport, start awareness/presence, and solicit a `sync`
    /// catch-up (§4.6).
    pub async fn connect(self: &Arc<Self>) -> Result<()> {
        let weak = Arc::downgrade(self);
        self.transport.on(Box::new(move |event| {
            if let Some(room) = weak.upgrade() {
                room.handle_transport_event(event);
            }
        }));

        self.transport.connect().await?;

        let transport = Arc::clone(&self.transport);
        self.presence.start(move |update| {
            if let Ok(payload) = serde_json::to_value(update) {
                transport.send(MessageType::Presence, payload);
            }
        });

        let transport = Arc::clone(&self.transport);
        self.awareness.start(move |state| {
            if let Ok(payload) = serde_json::to_value(state) {
                transport.send(MessageType::Awareness, payload);
            }
        });

        let request = SyncMessage::Request;
        self.transport.send(MessageType::Sync, serde_json::to_value(&request).unwrap_or_default());
        Ok(())
    }

    pub fn disconnect(&self) {
        self.presence.stop();
        self.awareness.stop();
        self.transport.disconnect();
    }

    fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Message(envelope) => self.dispatch_message(envelope),
            TransportEvent::Error(e) => {
                tracing::warn!(error = %e, "transport error");
                self.listeners.emit(&RoomEvent::Error(e));
            }
            TransportEvent::Disconnect { reason } => tracing::info!(%reason, "room transport disconnected"),
            TransportEvent::Reconnecting { attempt } => tracing::info!(attempt, "room transport reconnecting"),
            TransportEvent::Connect => tracing::info!(room_id = %self.room_id, "room transport connected"),
        }
    }

    fn dispatch_message(&self, envelope: Envelope) {
        if envelope.client_id == self.client_id.as_str() {
            return; // a room facade drops its own echoes same as the transport edge
        }
        match envelope.message_type {
            MessageType::Presence => self.dispatch_presence(envelope.payload),
            MessageType::Awareness => self.dispatch_awareness(envelope.payload),
            MessageType::Operation => self.dispatch_operation(envelope.payload),
            MessageType::Sync => self.dispatch_sync(envelope.payload),
            MessageType::Cursor | MessageType::Ack | MessageType::Error => {
                tracing::debug!(kind = envelope.message_type.as_str(), "forwarded to host");
            }
            MessageType::Ping | MessageType::Pong => {} // consumed by the transport layer
        }
    }

    fn dispatch_presence(&self, payload: serde_json::Value) {
        match serde_json::from_value::<PresenceUpdate>(payload) {
            Ok(update) => {
                match &update {
                    PresenceUpdate::Join { presence } => {
                        self.listeners.emit(&RoomEvent::PresenceJoined(presence.clone()));
                    }
                    PresenceUpdate::Leave { presence } => {
                        self.listeners.emit(&RoomEvent::PresenceLeft(presence.client_id.clone()));
                    }
                    _ => {}
                }
                self.presence.handle_remote_update(update);
            }
            Err(e) => tracing::warn!(error = %e, "malformed presence payload"),
        }
    }

    fn dispatch_awareness(&self, payload: serde_json::Value) {
        match serde_json::from_value::<AwarenessState>(payload) {
            Ok(state) => {
                if let Some(decoration) = self.derive_cursor(&state) {
                    self.listeners.emit(&RoomEvent::Cursor(decoration));
                }
                self.awareness.handle_remote_update(state);
            }
            Err(e) => tracing::warn!(error = %e, "malformed awareness payload"),
        }
    }

    fn dispatch_operation(&self, payload: serde_json::Value) {
        let mut model = self.model.lock();
        let result = match &mut *model {
            CoordinationModel::Crdt(doc) => serde_json::from_value::<Update>(payload)
                .map_err(|source| RoomError::MalformedPayload { kind: "operation", source })
                .and_then(|update| doc.apply_update(update).map_err(RoomError::from)),
            CoordinationModel::Ot(client) => serde_json::from_value::<OperationWithMeta>(payload)
                .map_err(|source| RoomError::MalformedPayload { kind: "operation", source })
                .and_then(|op| client.on_remote(op).map_err(RoomError::from)),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "rejected remote operation");
            drop(model);
            self.listeners.emit(&RoomEvent::Error(e.to_string()));
        }
    }

    fn dispatch_sync(&self, payload: serde_json::Value) {
        match serde_json::from_value::<SyncMessage>(payload) {
            Ok(SyncMessage::Request) => self.reply_to_sync_request(),
            Ok(SyncMessage::State { doc, awareness }) => {
                if let Some(update) = doc {
                    if let CoordinationModel::Crdt(d) = &mut *self.model.lock() {
                        if let Err(e) = d.apply_update(update) {
                            tracing::warn!(error = %e, "rejected sync state update");
                        }
                    }
                }
                self.awareness.apply_states(awareness);
            }
            Err(e) => tracing::warn!(error = %e, "malformed sync payload"),
        }
    }

    fn reply_to_sync_request(&self) {
        let doc_update = match &*self.model.lock() {
            CoordinationModel::Crdt(doc) => Some(doc.get_update(None)),
            CoordinationModel::Ot(_) => None,
        };
        let response = SyncMessage::State { doc: doc_update, awareness: self.awareness.get_all_states() };
        if let Ok(payload) = serde_json::to_value(&response) {
            self.transport.send(MessageType::Sync, payload);
        }
    }

    /// Derive a cursor decoration from an awareness state carrying a
    /// `"cursor": {line, column}` field, if present.
    fn derive_cursor(&self, state: &AwarenessState) -> Option<CursorDecoration> {
        let cursor = state.state.get("cursor")?;
        let position: CursorPosition = serde_json::from_value(cursor.clone()).ok()?;
        let presence = self.presence.get_presence(&state.client_id);
        Some(CursorDecoration {
            client_id: state.client_id.clone(),
            color: presence.as_ref().map(|p| p.color.clone()).unwrap_or_default(),
            name: presence.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
            pixel: cursor_to_pixels(position),
        })
    }
}

// Keep the awareness/presence event channels importable from this module
// for hosts that want to subscribe directly rather than through `RoomEvent`.
pub use collab_awareness::AwarenessEvent as RoomAwarenessEvent;
pub use collab_presence::PresenceEvent as RoomPresenceEvent;
