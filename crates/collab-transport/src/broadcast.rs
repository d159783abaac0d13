//! In-process broadcast transport for same-origin "tabs" sharing one room.
//!
//! Per design note (§9.4): this variant has no reconnect or heartbeat
//! machinery and its notion of connectedness is purely process-local — it
//! exists to let multiple in-process peers (e.g. browser tabs behind one
//! `BroadcastChannel`, or co-located test replicas) exchange envelopes
//! without opening a socket.

use crate::envelope::{Envelope, MessageType};
use crate::error::Result;
use crate::events::{EventEmitter, TransportEvent, Unsubscribe};
use crate::transport::Transport;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;

/// Shared in-process bus. Every [`BroadcastTransport`] created from the same
/// hub can see each other's sends, mirroring same-origin tabs sharing one
/// `BroadcastChannel`.
#[derive(Clone)]
pub struct BroadcastHub {
    sender: broadcast::Sender<Envelope>,
}

impl BroadcastHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        BroadcastHub { sender }
    }

    /// Create a transport for `client_id` attached to this hub.
    #[must_use]
    pub fn transport(&self, room_id: impl Into<String>, client_id: impl Into<String>) -> Arc<BroadcastTransport> {
        let room_id = room_id.into();
        let client_id = client_id.into();
        let sender = self.sender.clone();
        Arc::new_cyclic(|weak| BroadcastTransport {
            room_id,
            client_id,
            sender,
            events: EventEmitter::new(),
            state: Mutex::new(State {
                connected: false,
                generation: 0,
            }),
            self_weak: weak.clone(),
        })
    }
}

struct State {
    connected: bool,
    generation: u64,
}

/// Same-origin broadcast transport; see module docs.
pub struct BroadcastTransport {
    room_id: String,
    client_id: String,
    sender: broadcast::Sender<Envelope>,
    events: EventEmitter,
    state: Mutex<State>,
    self_weak: Weak<BroadcastTransport>,
}

impl BroadcastTransport {
    fn spawn_reader(self: &Arc<Self>, generation: u64) {
        let mut rx = self.sender.subscribe();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(env) => {
                        if this.state.lock().generation != generation {
                            break;
                        }
                        if env.client_id == this.client_id {
                            continue; // filter self-originated messages at the sender-id check
                        }
                        if env.is_pong() {
                            continue;
                        }
                        this.events.emit(TransportEvent::Message(env));
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

#[async_trait]
impl Transport for BroadcastTransport {
    async fn connect(&self) -> Result<()> {
        let generation = {
            let mut state = self.state.lock();
            if state.connected {
                return Ok(());
            }
            state.connected = true;
            state.generation += 1;
            state.generation
        };
        let this = self.self_weak.upgrade().expect("transport dropped during connect");
        this.spawn_reader(generation);
        self.events.emit(TransportEvent::Connect);
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = self.state.lock();
        state.connected = false;
        state.generation += 1;
        drop(state);
        self.events.emit(TransportEvent::Disconnect {
            reason: "disconnect() called".to_string(),
        });
    }

    fn send(&self, message_type: MessageType, payload: serde_json::Value) {
        let env = Envelope::new(message_type, &self.room_id, &self.client_id, payload);
        let _ = self.sender.send(env); // no subscribers is not an error here
    }

    fn on(&self, handler: Box<dyn Fn(TransportEvent) + Send + Sync>) -> Unsubscribe {
        self.events.on(handler)
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn delivers_between_two_clients_but_not_to_self() {
        let hub = BroadcastHub::new(16);
        let a = hub.transport("room", "a");
        let b = hub.transport("room", "b");
        a.connect().await.unwrap();
        b.connect().await.unwrap();

        let received = Arc::new(AtomicUsize::new(0));
        let received_clone = received.clone();
        b.on(Box::new(move |event| {
            if let TransportEvent::Message(_) = event {
                received_clone.fetch_add(1, Ordering::SeqCst);
            }
        }));

        a.send(MessageType::Awareness, serde_json::json!({"x": 1}));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(received.load(Ordering::SeqCst), 1);
    }
}
