//! A small cancellable listener registry, shared by `Awareness` subscribers.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct Listeners<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Arc<dyn Fn(&T) + Send + Sync>)>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Listeners { next_id: AtomicU64::new(0), handlers: Mutex::new(Vec::new()) }
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
        self.handlers.lock().push((id, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.handlers.lock().retain(|(hid, _)| *hid != id);
    }

    pub fn emit(&self, event: &T) {
        let handlers: Vec<_> = self.handlers.lock().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(event);
        }
    }
}
