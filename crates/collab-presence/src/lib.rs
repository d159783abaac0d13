//! collab-presence: user identity, activity status and idle detection, a
//! thin layer over awareness + transport (§4.5).

pub mod config;
pub mod listeners;
pub mod state;

pub use config::PresenceConfig;
pub use state::{CursorPosition, PresenceEvent, PresenceStatus, PresenceUpdate, Selection, UserPresence};

use collab_common::{now_ms, ClientId};
use listeners::Listeners;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

type OutboundHandler = Arc<dyn Fn(&PresenceUpdate) + Send + Sync>;

struct Inner {
    config: PresenceConfig,
    local: Mutex<UserPresence>,
    remote: Mutex<HashMap<ClientId, UserPresence>>,
    listeners: Listeners<PresenceEvent>,
    outbound: Mutex<Option<OutboundHandler>>,
    heartbeat_handle: Mutex<Option<JoinHandle<()>>>,
    idle_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Tracks the local user's presence and a room's remote roster.
#[derive(Clone)]
pub struct PresenceManager {
    inner: Arc<Inner>,
}

impl PresenceManager {
    #[must_use]
    pub fn new(local: UserPresence, config: PresenceConfig) -> Self {
        PresenceManager {
            inner: Arc::new(Inner {
                config,
                local: Mutex::new(local),
                remote: Mutex::new(HashMap::new()),
                listeners: Listeners::new(),
                outbound: Mutex::new(None),
                heartbeat_handle: Mutex::new(None),
                idle_handle: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn local_presence(&self) -> UserPresence {
        self.inner.local.lock().clone()
    }

    fn emit_outbound(&self, update: PresenceUpdate) {
        if let Some(handler) = self.inner.outbound.lock().as_ref() {
            handler(&update);
        }
    }

    /// Install the outbound callback, emit `join`, and start the heartbeat
    /// and idle timers.
    pub fn start<F>(&self, outbound: F)
    where
        F: Fn(&PresenceUpdate) + Send + Sync + 'static,
    {
        *self.inner.outbound.lock() = Some(Arc::new(outbound));
        self.emit_outbound(PresenceUpdate::Join { presence: self.local_presence() });
        self.start_heartbeat();
        self.restart_idle_timer();
    }

    fn start_heartbeat(&self) {
        let inner = Arc::clone(&self.inner);
        let interval = inner.config.heartbeat_interval;
        let stale_after = interval.saturating_mul(3).as_millis() as u64;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let presence = {
                    let mut local = inner.local.lock();
                    local.last_seen = now_ms();
                    local.clone()
                };
                if let Some(handler) = inner.outbound.lock().as_ref() {
                    handler(&PresenceUpdate::Heartbeat { presence });
                }

                let now = now_ms();
                let stale: Vec<ClientId> = inner
                    .remote
                    .lock()
                    .iter()
                    .filter(|(_, p)| now.saturating_sub(p.last_seen) > stale_after)
                    .map(|(id, _)| id.clone())
                    .collect();
                if stale.is_empty() {
                    continue;
                }
                tracing::debug!(count = stale.len(), "pruning stale presence entries past heartbeat timeout");
                let mut remote = inner.remote.lock();
                for id in &stale {
                    remote.remove(id);
                }
                drop(remote);
                for id in stale {
                    inner.listeners.emit(&PresenceEvent::Left(id));
                }
            }
        });
        *self.inner.heartbeat_handle.lock() = Some(handle);
    }

    /// Cancel and restart the idle timer; flips local status back to
    /// `online` immediately if it had gone `idle`. Call on every
    /// activity-equivalent signal (input, pointer, scroll, visibility).
    pub fn notify_activity(&self) {
        let became_online = {
            let mut local = self.inner.local.lock();
            if local.status == PresenceStatus::Idle {
                local.status = PresenceStatus::Online;
                true
            } else {
                false
            }
        };
        if became_online {
            self.emit_outbound(PresenceUpdate::Update { presence: self.local_presence() });
        }
        self.restart_idle_timer();
    }

    fn restart_idle_timer(&self) {
        if let Some(handle) = self.inner.idle_handle.lock().take() {
            handle.abort();
        }
        let inner = Arc::clone(&self.inner);
        let timeout = inner.config.idle_timeout;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let presence = {
                let mut local = inner.local.lock();
                local.status = PresenceStatus::Idle;
                local.clone()
            };
            if let Some(handler) = inner.outbound.lock().as_ref() {
                handler(&PresenceUpdate::Update { presence });
            }
        });
        *self.inner.idle_handle.lock() = Some(handle);
    }

    /// Ingest a peer's presence update.
    pub fn handle_remote_update(&self, update: PresenceUpdate) {
        match update {
            PresenceUpdate::Leave { presence } => {
                self.inner.remote.lock().remove(&presence.client_id);
                self.inner.listeners.emit(&PresenceEvent::Left(presence.client_id));
            }
            PresenceUpdate::Join { presence } => {
                self.inner.remote.lock().insert(presence.client_id.clone(), presence.clone());
                self.inner.listeners.emit(&PresenceEvent::Joined(presence));
            }
            PresenceUpdate::Update { presence } | PresenceUpdate::Heartbeat { presence } => {
                self.inner.remote.lock().insert(presence.client_id.clone(), presence.clone());
                self.inner.listeners.emit(&PresenceEvent::Updated(presence));
            }
        }
    }

    #[must_use]
    pub fn get_presence(&self, client_id: &ClientId) -> Option<UserPresence> {
        self.inner.remote.lock().get(client_id).cloned()
    }

    #[must_use]
    pub fn get_all_presences(&self) -> Vec<UserPresence> {
        self.inner.remote.lock().values().cloned().collect()
    }

    pub fn subscribe<F>(&self, listener: F) -> u64
    where
        F: Fn(&PresenceEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.on(listener)
    }

    pub fn unsubscribe(&self, id: u64) {
        self.inner.listeners.unsubscribe(id);
    }

    /// Emit `leave` and halt the heartbeat and idle timers.
    pub fn stop(&self) {
        self.emit_outbound(PresenceUpdate::Leave { presence: self.local_presence() });
        if let Some(handle) = self.inner.heartbeat_handle.lock().take() {
            handle.abort();
        }
        if let Some(handle) = self.inner.idle_handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn color_is_derived_when_not_supplied() {
        let presence = UserPresence::new(ClientId::from("alice"), "Alice");
        assert!(presence.color.starts_with("hsl("));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timer_flips_status_after_timeout() {
        let config = PresenceConfig::default().with_idle_timeout(Duration::from_millis(50));
        let local = UserPresence::new(ClientId::from("alice"), "Alice");
        let manager = PresenceManager::new(local, config);
        manager.start(|_| {});
        tokio::time::advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert_eq!(manager.local_presence().status, PresenceStatus::Idle);

        manager.notify_activity();
        assert_eq!(manager.local_presence().status, PresenceStatus::Online);
    }

    #[test]
    fn remote_leave_removes_and_notifies() {
        let local = UserPresence::new(ClientId::from("alice"), "Alice");
        let manager = PresenceManager::new(local, PresenceConfig::default());
        let bob = UserPresence::new(ClientId::from("bob"), "Bob");
        manager.handle_remote_update(PresenceUpdate::Join { presence: bob.clone() });
        assert!(manager.get_presence(&bob.client_id).is_some());
        manager.handle_remote_update(PresenceUpdate::Leave { presence: bob.clone() });
        assert!(manager.get_presence(&bob.client_id).is_none());
    }
}
