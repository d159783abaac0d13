//! End-to-end exercises of the composition facade over the in-process
//! broadcast transport: no real socket, but the full connect/dispatch path
//! (§4.6, §8 concrete scenarios) runs exactly as it would over a WebSocket.

use collab_awareness::AwarenessConfig;
use collab_common::ClientId;
use collab_crdt::{Doc, Text};
use collab_ot::{Op, OtClient};
use collab_presence::{PresenceConfig, UserPresence};
use collab_room::{CollabRoom, CoordinationModel, RoomEvent};
use collab_transport::{BroadcastHub, MessageType, Transport, TransportEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn crdt_room(hub: &BroadcastHub, room_id: &str, client: &str, name: &str) -> Arc<CollabRoom> {
    let client_id = ClientId::from(client);
    CollabRoom::new(
        client_id.clone(),
        room_id,
        hub.transport(room_id, client),
        CoordinationModel::Crdt(Doc::new(client_id.clone())),
        AwarenessConfig::default(),
        PresenceConfig::default(),
        UserPresence::new(client_id, name),
    )
}

/// §8 scenario 1: two replicas insert at the same position of an empty text
/// concurrently; both must materialize the same string afterward.
#[tokio::test]
async fn two_crdt_rooms_converge_on_concurrent_inserts() {
    let hub = BroadcastHub::new(32);
    let room_a = crdt_room(&hub, "room-1", "alice", "Alice");
    let room_b = crdt_room(&hub, "room-1", "bob", "Bob");

    room_a.connect().await.unwrap();
    room_b.connect().await.unwrap();
    settle().await;

    room_a
        .with_doc(|doc| Text::new(doc, "content").insert(0, "Hello"))
        .expect("room is in CRDT mode")
        .unwrap();
    room_b
        .with_doc(|doc| Text::new(doc, "content").insert(0, "World"))
        .expect("room is in CRDT mode")
        .unwrap();
    settle().await;

    let content_a = room_a.with_doc(|doc| Text::new(doc, "content").content()).unwrap();
    let content_b = room_b.with_doc(|doc| Text::new(doc, "content").content()).unwrap();
    assert_eq!(content_a, content_b);
    assert!(content_a == "HelloWorld" || content_a == "WorldHello");
}

/// A local delete must reach the peer room the same way a local insert
/// does: `Text::delete` has to emit a `DocUpdate` (not just the
/// `TextEvent`), or the deleting room's own transport never sends an
/// `operation` message and the other room's document never converges.
#[tokio::test]
async fn text_delete_propagates_to_the_peer_room() {
    let hub = BroadcastHub::new(32);
    let room_a = crdt_room(&hub, "room-1", "alice", "Alice");
    let room_b = crdt_room(&hub, "room-1", "bob", "Bob");

    room_a.connect().await.unwrap();
    room_b.connect().await.unwrap();
    settle().await;

    room_a
        .with_doc(|doc| Text::new(doc, "content").insert(0, "Hello"))
        .expect("room is in CRDT mode")
        .unwrap();
    settle().await;
    assert_eq!(room_b.with_doc(|doc| Text::new(doc, "content").content()).unwrap(), "Hello");

    room_a
        .with_doc(|doc| Text::new(doc, "content").delete(1, 3))
        .expect("room is in CRDT mode")
        .unwrap();
    settle().await;

    assert_eq!(room_a.with_doc(|doc| Text::new(doc, "content").content()).unwrap(), "Ho");
    assert_eq!(
        room_b.with_doc(|doc| Text::new(doc, "content").content()).unwrap(),
        "Ho",
        "bob never received the delete because alice's room never forwarded it"
    );
}

/// A local OT edit must reach the transport as an `operation` envelope;
/// this is the seam `CollabRoom::new` wires via `OtClient::on_send`.
#[tokio::test]
async fn ot_room_forwards_local_edits_as_operation_messages() {
    let hub = BroadcastHub::new(32);
    let observer = hub.transport("room-1", "observer");
    observer.connect().await.unwrap();

    let client_id = ClientId::from("alice");
    let room = CollabRoom::new(
        client_id.clone(),
        "room-1",
        hub.transport("room-1", "alice"),
        CoordinationModel::Ot(OtClient::new(client_id.clone(), "")),
        AwarenessConfig::default(),
        PresenceConfig::default(),
        UserPresence::new(client_id, "Alice"),
    );
    room.connect().await.unwrap();
    settle().await;

    let operations_seen = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&operations_seen);
    observer.on(Box::new(move |event| {
        if let TransportEvent::Message(envelope) = event {
            if envelope.message_type == MessageType::Operation {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        }
    }));

    room.with_ot_client(|client| {
        client
            .local_edit(vec![Op::Insert { position: 0, text: "hi".into() }])
            .unwrap();
    })
    .expect("room is in OT mode");
    settle().await;

    assert_eq!(operations_seen.load(Ordering::SeqCst), 1);
}

/// Connecting announces presence, and a local awareness update carrying a
/// cursor reaches the peer as both a remote awareness entry and a
/// `RoomEvent::Cursor` decoration (§4.6 "awareness -> derive a cursor
/// decoration").
#[tokio::test]
async fn presence_join_and_awareness_cursor_reach_the_peer() {
    let hub = BroadcastHub::new(32);
    let room_a = crdt_room(&hub, "room-1", "alice", "Alice");
    let room_b = crdt_room(&hub, "room-1", "bob", "Bob");

    let joined = Arc::new(AtomicUsize::new(0));
    let j = Arc::clone(&joined);
    room_b.subscribe(move |event| {
        if let RoomEvent::PresenceJoined(_) = event {
            j.fetch_add(1, Ordering::SeqCst);
        }
    });
    let cursors = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&cursors);
    room_b.subscribe(move |event| {
        if let RoomEvent::Cursor(_) = event {
            c.fetch_add(1, Ordering::SeqCst);
        }
    });

    room_b.connect().await.unwrap();
    room_a.connect().await.unwrap();
    settle().await;
    assert_eq!(joined.load(Ordering::SeqCst), 1);

    room_a
        .awareness()
        .set_local_state(serde_json::json!({"cursor": {"line": 1, "column": 2}}));
    settle().await;

    assert_eq!(cursors.load(Ordering::SeqCst), 1);
    let remote = room_b
        .awareness()
        .get_remote_state(&ClientId::from("alice"))
        .expect("alice's awareness state reached bob");
    assert_eq!(remote.state["cursor"]["line"], 1);
}
