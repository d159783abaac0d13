//! WebSocket transport: the networked variant of [`crate::Transport`].
//!
//! Connect sequence, queueing and reconnect semantics follow §4.1 of the
//! collab wire spec. A single supervisor task owns the socket for the
//! lifetime of one session; `send`/`disconnect`/`is_connected` only ever
//! touch a small piece of shared state guarded by a `Mutex`, never the
//! socket itself.

use crate::backoff::{ReconnectDecision, ReconnectState};
use crate::config::TransportConfig;
use crate::envelope::{Envelope, MessageType};
use crate::error::{Result, TransportError};
use crate::events::{EventEmitter, TransportEvent, Unsubscribe};
use crate::queue::MessageQueue;
use crate::transport::Transport;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message as WsMessage;

struct Shared {
    connected: bool,
    auto_reconnect: bool,
    queue: MessageQueue<Envelope>,
    reconnect: ReconnectState,
    writer: Option<mpsc::UnboundedSender<WsMessage>>,
    /// Bumped on every `connect`/`disconnect`; background tasks compare it
    /// against the generation they were spawned with and quietly stop if it
    /// no longer matches, instead of reaching into torn-down state.
    generation: u64,
}

/// WebSocket-backed transport connecting a client to a room peer.
///
/// `roomId` and `clientId` travel in the connect URL's query string, as the
/// spec's handshake requires.
pub struct WebSocketTransport {
    url: url::Url,
    room_id: String,
    client_id: String,
    config: TransportConfig,
    events: EventEmitter,
    shared: Mutex<Shared>,
    generation_counter: AtomicU64,
    self_weak: Weak<WebSocketTransport>,
}

impl WebSocketTransport {
    /// Construct a transport for `base_url`, appending `roomId`/`clientId`
    /// query parameters. Returns an error if `base_url` cannot be parsed.
    pub fn new(
        base_url: &str,
        room_id: impl Into<String>,
        client_id: impl Into<String>,
        config: TransportConfig,
    ) -> Result<Arc<Self>> {
        let room_id = room_id.into();
        let client_id = client_id.into();
        let mut url = url::Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("roomId", &room_id)
            .append_pair("clientId", &client_id);

        let reconnect = ReconnectState::new(config.reconnect_delay, config.max_reconnect_attempts);
        Ok(Arc::new_cyclic(|weak| WebSocketTransport {
            url,
            room_id,
            client_id,
            events: EventEmitter::new(),
            shared: Mutex::new(Shared {
                connected: false,
                auto_reconnect: config.reconnect,
                queue: MessageQueue::new(config.message_queue_size),
                reconnect,
                writer: None,
                generation: 0,
            }),
            config,
            generation_counter: AtomicU64::new(0),
            self_weak: weak.clone(),
        }))
    }

    fn bump_generation(&self) -> u64 {
        let gen = self.generation_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.lock().generation = gen;
        gen
    }

    fn current_generation(&self) -> u64 {
        self.shared.lock().generation
    }

    /// Drive one connect attempt; returns once the session has ended
    /// (cleanly or not). Never called concurrently with itself for the same
    /// generation.
    ///
    /// `connect_result`, when present, is fulfilled exactly once with the
    /// outcome of *this* dial attempt — the `Transport::connect` caller that
    /// spawned us awaits it so a pre-open failure rejects its promise
    /// instead of returning `Ok(())` for a socket that never opened.
    async fn run_session(self: Arc<Self>, generation: u64, connect_result: Option<oneshot::Sender<Result<()>>>) {
        let (ws_stream, _response) = match tokio_tungstenite::connect_async(self.url.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                let message = format!("connect failed: {e}");
                tracing::warn!(room = %self.room_id, error = %e, "dial failed");
                self.events.emit(TransportEvent::Error(message.clone()));
                if let Some(tx) = connect_result {
                    let _ = tx.send(Err(TransportError::ConnectFailed(message)));
                }
                self.schedule_reconnect(generation);
                return;
            }
        };

        if self.current_generation() != generation {
            if let Some(tx) = connect_result {
                let _ = tx.send(Err(TransportError::Closed));
            }
            return; // superseded by a disconnect/reconnect while we were dialing
        }

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<WsMessage>();

        {
            let mut shared = self.shared.lock();
            shared.connected = true;
            shared.reconnect.reset();
            shared.writer = Some(writer_tx.clone());
        }
        self.events.emit(TransportEvent::Connect);
        if let Some(tx) = connect_result {
            let _ = tx.send(Ok(()));
        }
        self.flush_queue();

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let heartbeat_room = self.room_id.clone();
        let heartbeat_client = self.client_id.clone();
        let heartbeat_tx = writer_tx.clone();
        let ping_interval = self.config.ping_interval;
        let heartbeat = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ping_interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let ping = Envelope::ping(&heartbeat_room, &heartbeat_client);
                        if let Ok(wire) = ping.to_wire() {
                            if heartbeat_tx.send(WsMessage::Text(wire.into())).is_err() {
                                break;
                            }
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }
        });

        let writer_task = tokio::spawn(async move {
            while let Some(msg) = writer_rx.recv().await {
                if ws_tx.send(msg).await.is_err() {
                    break;
                }
            }
        });

        let close_reason = loop {
            match ws_rx.next().await {
                Some(Ok(WsMessage::Text(text))) => match Envelope::from_wire(&text) {
                    Ok(env) if env.is_pong() => { /* consumed silently */ }
                    Ok(env) => self.events.emit(TransportEvent::Message(env)),
                    Err(e) => {
                        tracing::warn!(room = %self.room_id, error = %e, "malformed inbound frame");
                        self.events
                            .emit(TransportEvent::Error(format!("malformed frame: {e}")));
                    }
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    break frame.map(|f| f.reason.to_string()).unwrap_or_default();
                }
                Some(Ok(_)) => { /* ignore binary/ping/pong control frames at the ws layer */ }
                Some(Err(e)) => break format!("transport error: {e}"),
                None => break "stream ended".to_string(),
            }
        };

        let _ = stop_tx.send(());
        heartbeat.abort();
        writer_task.abort();

        let still_current = {
            let mut shared = self.shared.lock();
            if shared.generation == generation {
                shared.connected = false;
                shared.writer = None;
                true
            } else {
                false
            }
        };
        if !still_current {
            return;
        }

        self.events.emit(TransportEvent::Disconnect {
            reason: close_reason,
        });
        self.schedule_reconnect(generation);
    }

    fn schedule_reconnect(self: &Arc<Self>, generation: u64) {
        let auto_reconnect = self.shared.lock().auto_reconnect;
        if !auto_reconnect {
            return;
        }
        let decision = self.shared.lock().reconnect.next();
        match decision {
            ReconnectDecision::Retry { delay, attempt } => {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if this.current_generation() != generation {
                        return;
                    }
                    this.events
                        .emit(TransportEvent::Reconnecting { attempt });
                    tokio::spawn(Arc::clone(&this).run_session(generation, None));
                });
            }
            ReconnectDecision::GiveUp => {
                self.events.emit(TransportEvent::Error(format!(
                    "{}",
                    TransportError::ReconnectExhausted(self.config.max_reconnect_attempts)
                )));
            }
        }
    }

    fn flush_queue(&self) {
        let (writer, queued) = {
            let mut shared = self.shared.lock();
            let writer = shared.writer.clone();
            let queued = shared.queue.drain();
            (writer, queued)
        };
        if let Some(writer) = writer {
            for env in queued {
                if let Ok(wire) = env.to_wire() {
                    let _ = writer.send(WsMessage::Text(wire.into()));
                }
            }
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self) -> Result<()> {
        if self.shared.lock().connected {
            return Ok(());
        }
        let generation = self.bump_generation();
        let this = self
            .self_weak
            .upgrade()
            .ok_or_else(|| TransportError::Closed)?;
        let (tx, rx) = oneshot::channel();
        tokio::spawn(this.run_session(generation, Some(tx)));
        rx.await.map_err(|_| TransportError::Closed)?
    }

    fn disconnect(&self) {
        let mut shared = self.shared.lock();
        shared.auto_reconnect = false;
        shared.connected = false;
        shared.writer = None;
        shared.generation += 1; // orphans any in-flight session/reconnect task
    }

    fn send(&self, message_type: MessageType, payload: serde_json::Value) {
        let env = Envelope::new(message_type, &self.room_id, &self.client_id, payload);
        let mut shared = self.shared.lock();
        if shared.connected {
            if let Some(writer) = &shared.writer {
                if let Ok(wire) = env.to_wire() {
                    let _ = writer.send(WsMessage::Text(wire.into()));
                }
                return;
            }
        }
        shared.queue.push(env);
    }

    fn on(&self, handler: Box<dyn Fn(TransportEvent) + Send + Sync>) -> Unsubscribe {
        self.events.on(handler)
    }

    fn is_connected(&self) -> bool {
        self.shared.lock().connected
    }
}
