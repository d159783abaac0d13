//! Observer fan-out for document and container-level changes (§4.2, §9).
//!
//! Mirrors the listener-registry shape used by `collab-transport`'s
//! `EventEmitter`: per-owner registries, cancellation handles, no retained
//! references after unsubscribe.

use crate::delete_set::DeleteSet;
use crate::item::Item;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// One piece of a text delta (`applyDelta`'s op vocabulary, §3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DeltaOp {
    Insert {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<serde_json::Value>,
    },
    Delete {
        count: usize,
    },
    Retain {
        count: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<serde_json::Value>,
    },
}

/// Event fired to Text observers after a local or remote mutation.
#[derive(Clone, Debug)]
pub struct TextEvent {
    pub delta: Vec<DeltaOp>,
}

/// Event fired to Array observers.
#[derive(Clone, Debug)]
pub enum ArrayEvent {
    Insert { index: usize, values: Vec<serde_json::Value> },
    Delete { index: usize, count: usize },
}

/// Event fired to Map observers.
#[derive(Clone, Debug)]
pub enum MapEvent {
    Set { key: String, value: serde_json::Value },
    Delete { key: String },
}

/// Fired to document-level `onUpdate` listeners after any local or remote
/// mutation (§4.2 "Local mutation", "Remote apply").
#[derive(Clone, Debug)]
pub struct DocUpdate {
    pub items: Vec<Item>,
    pub delete_set: DeleteSet,
    pub origin: UpdateOrigin,
}

/// Distinguishes a locally-generated update from one applied from a peer, so
/// a room facade can avoid re-broadcasting what it just received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOrigin {
    Local,
    Remote,
}

/// A generic, cancellable listener registry.
pub struct Listeners<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Arc<dyn Fn(&T) + Send + Sync>)>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Listeners {
            next_id: AtomicU64::new(0),
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Listeners<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, handler: F) -> u64
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().unwrap().push((id, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.handlers.lock().unwrap().retain(|(hid, _)| *hid != id);
    }

    pub fn emit(&self, event: &T) {
        let handlers: Vec<_> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn emits_to_every_listener_and_respects_unsubscribe() {
        let listeners: Listeners<u32> = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let id = listeners.on(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        listeners.emit(&1);
        listeners.unsubscribe(id);
        listeners.emit(&2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
