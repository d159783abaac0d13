//! Listener fan-out shared by every transport variant.
//!
//! Registries are owned per-instance; `on` returns a cancellation handle and
//! the registry drops its reference to a closure as soon as that handle is
//! used, so unsubscribed listeners are never invoked again.

use crate::envelope::Envelope;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Events emitted by a [`crate::Transport`].
#[derive(Clone, Debug)]
pub enum TransportEvent {
    Connect,
    Disconnect { reason: String },
    Message(Envelope),
    Error(String),
    Reconnecting { attempt: u32 },
}

type Listener = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// Handle returned by [`EventEmitter::on`]; dropping it does not unsubscribe,
/// call [`Unsubscribe::unsubscribe`] explicitly.
#[must_use = "dropping this handle does not remove the listener; call unsubscribe()"]
pub struct Unsubscribe {
    id: u64,
    registry: Arc<Mutex<HashMap<u64, Listener>>>,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        self.registry.lock().unwrap().remove(&self.id);
    }
}

/// Per-transport registry of event listeners.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<Mutex<HashMap<u64, Listener>>>,
    next_id: Arc<AtomicU64>,
}

impl EventEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener invoked for every subsequent event.
    pub fn on<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(TransportEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().unwrap().insert(id, Arc::new(handler));
        Unsubscribe {
            id,
            registry: self.listeners.clone(),
        }
    }

    /// Fan out an event to every currently registered listener.
    pub fn emit(&self, event: TransportEvent) {
        let listeners: Vec<Listener> = self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn emits_to_all_listeners() {
        let emitter = EventEmitter::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c1 = count.clone();
        let c2 = count.clone();
        emitter.on(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        emitter.on(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });
        emitter.emit(TransportEvent::Connect);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_future_events() {
        let emitter = EventEmitter::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c1 = count.clone();
        let handle = emitter.on(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        emitter.emit(TransportEvent::Connect);
        handle.unsubscribe();
        emitter.emit(TransportEvent::Connect);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count(), 0);
    }
}
