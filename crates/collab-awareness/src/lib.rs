//! collab-awareness: ephemeral per-client state with clock-based
//! last-write-wins and timeout-based garbage collection (§4.4).

pub mod config;
pub mod listeners;
pub mod state;

pub use config::AwarenessConfig;
pub use state::{AwarenessEvent, AwarenessState};

use collab_common::{now_ms, ClientId};
use listeners::Listeners;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

type OutboundHandler = Arc<dyn Fn(&AwarenessState) + Send + Sync>;

struct Inner {
    local: Mutex<AwarenessState>,
    remote: Mutex<HashMap<ClientId, AwarenessState>>,
    listeners: Listeners<AwarenessEvent>,
    outbound: Mutex<Option<OutboundHandler>>,
    gc_handle: Mutex<Option<JoinHandle<()>>>,
    config: AwarenessConfig,
}

/// One client's awareness of itself and of its peers in a room.
///
/// Cheaply cloneable: the GC task and every handle share the same `Inner`.
#[derive(Clone)]
pub struct Awareness {
    inner: Arc<Inner>,
}

impl Awareness {
    #[must_use]
    pub fn new(client_id: ClientId, config: AwarenessConfig) -> Self {
        let local = AwarenessState::new(client_id, 0, serde_json::Value::Null, now_ms());
        Awareness {
            inner: Arc::new(Inner {
                local: Mutex::new(local),
                remote: Mutex::new(HashMap::new()),
                listeners: Listeners::new(),
                outbound: Mutex::new(None),
                gc_handle: Mutex::new(None),
                config,
            }),
        }
    }

    #[must_use]
    pub fn local_state(&self) -> AwarenessState {
        self.inner.local.lock().clone()
    }

    /// Replace the local state wholesale.
    pub fn set_local_state(&self, value: serde_json::Value) {
        self.bump_local(|_| value);
    }

    /// Shallow-merge `partial` into the local state (object union; a
    /// non-object local state is replaced outright, same as a fresh `set`).
    pub fn update_local_state(&self, partial: serde_json::Value) {
        self.bump_local(|current| match (current, partial.clone()) {
            (serde_json::Value::Object(mut base), serde_json::Value::Object(patch)) => {
                base.extend(patch);
                serde_json::Value::Object(base)
            }
            (_, patch) => patch,
        });
    }

    fn bump_local(&self, f: impl FnOnce(serde_json::Value) -> serde_json::Value) {
        let next = {
            let mut local = self.inner.local.lock();
            let new_state = f(local.state.clone());
            local.clock += 1;
            local.state = new_state;
            local.timestamp = now_ms();
            local.clone()
        };
        if let Some(handler) = self.inner.outbound.lock().as_ref() {
            handler(&next);
        }
    }

    /// Ingest one peer's state. Idempotent: a `clock` no higher than the
    /// last-seen one for that client is dropped silently (§4.4).
    pub fn handle_remote_update(&self, incoming: AwarenessState) {
        let applied = {
            let mut remote = self.inner.remote.lock();
            match remote.get(&incoming.client_id) {
                Some(existing) if existing.clock >= incoming.clock => false,
                _ => {
                    remote.insert(incoming.client_id.clone(), incoming.clone());
                    true
                }
            }
        };
        if applied {
            self.inner.listeners.emit(&AwarenessEvent::Updated(incoming));
        }
    }

    pub fn apply_states(&self, states: Vec<AwarenessState>) {
        for state in states {
            self.handle_remote_update(state);
        }
    }

    #[must_use]
    pub fn get_remote_state(&self, client_id: &ClientId) -> Option<AwarenessState> {
        self.inner.remote.lock().get(client_id).cloned()
    }

    #[must_use]
    pub fn get_all_states(&self) -> Vec<AwarenessState> {
        self.inner.remote.lock().values().cloned().collect()
    }

    /// Register a listener. It immediately receives the current remote
    /// snapshot (one `Updated` per entry), then future updates and removals.
    pub fn subscribe<F>(&self, listener: F) -> u64
    where
        F: Fn(&AwarenessEvent) + Send + Sync + 'static,
    {
        for state in self.inner.remote.lock().values() {
            listener(&AwarenessEvent::Updated(state.clone()));
        }
        self.inner.listeners.on(listener)
    }

    pub fn unsubscribe(&self, id: u64) {
        self.inner.listeners.unsubscribe(id);
    }

    /// Install the outbound callback and begin the GC sweep.
    pub fn start<F>(&self, outbound: F)
    where
        F: Fn(&AwarenessState) + Send + Sync + 'static,
    {
        *self.inner.outbound.lock() = Some(Arc::new(outbound));
        let inner = Arc::clone(&self.inner);
        let gc_interval = inner.config.gc_interval;
        let timeout_ms = inner.config.timeout.as_millis() as u64;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(gc_interval);
            loop {
                ticker.tick().await;
                let stale: Vec<ClientId> = {
                    let remote = inner.remote.lock();
                    let now = now_ms();
                    remote
                        .iter()
                        .filter(|(_, s)| now.saturating_sub(s.timestamp) > timeout_ms)
                        .map(|(id, _)| id.clone())
                        .collect()
                };
                if stale.is_empty() {
                    continue;
                }
                tracing::debug!(count = stale.len(), "evicting stale awareness states");
                let mut remote = inner.remote.lock();
                for id in &stale {
                    remote.remove(id);
                }
                drop(remote);
                for id in stale {
                    inner.listeners.emit(&AwarenessEvent::Removed(id));
                }
            }
        });
        *self.inner.gc_handle.lock() = Some(handle);
    }

    /// Clear local state (one final, empty update) and halt the GC timer.
    pub fn stop(&self) {
        self.bump_local(|_| serde_json::Value::Null);
        if let Some(handle) = self.inner.gc_handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn stale_clock_is_dropped_idempotently() {
        let awareness = Awareness::new(ClientId::from("local"), AwarenessConfig::default());
        let peer = ClientId::from("peer");
        awareness.handle_remote_update(AwarenessState::new(peer.clone(), 5, serde_json::json!({"x": 1}), now_ms()));
        awareness.handle_remote_update(AwarenessState::new(peer.clone(), 3, serde_json::json!({"x": 2}), now_ms()));
        assert_eq!(awareness.get_remote_state(&peer).unwrap().state, serde_json::json!({"x": 1}));
    }

    #[test]
    fn higher_clock_overwrites() {
        let awareness = Awareness::new(ClientId::from("local"), AwarenessConfig::default());
        let peer = ClientId::from("peer");
        awareness.handle_remote_update(AwarenessState::new(peer.clone(), 1, serde_json::json!("a"), now_ms()));
        awareness.handle_remote_update(AwarenessState::new(peer.clone(), 2, serde_json::json!("b"), now_ms()));
        assert_eq!(awareness.get_remote_state(&peer).unwrap().state, serde_json::json!("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn gc_removes_and_notifies_after_timeout() {
        let config = AwarenessConfig::default()
            .with_timeout(Duration::from_millis(100))
            .with_gc_interval(Duration::from_millis(10));
        let awareness = Awareness::new(ClientId::from("local"), config);
        let peer = ClientId::from("peer");
        awareness.handle_remote_update(AwarenessState::new(peer.clone(), 1, serde_json::Value::Null, now_ms()));

        let removed = Arc::new(AtomicUsize::new(0));
        let r = removed.clone();
        awareness.subscribe(move |event| {
            if let AwarenessEvent::Removed(_) = event {
                r.fetch_add(1, Ordering::SeqCst);
            }
        });

        awareness.start(|_| {});
        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        assert!(awareness.get_remote_state(&peer).is_none());
        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }
}
