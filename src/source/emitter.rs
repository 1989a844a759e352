//! In-process event emitter

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{EventHandler, EventSource, SubscriptionId};
use crate::types::Payload;

type Listener = (SubscriptionId, Arc<dyn EventHandler>);

/// Dispatches events to handlers registered by event name
#[derive(Default)]
pub struct EventEmitter {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
    next_id: AtomicU64,
}

impl EventEmitter {
    /// Create an emitter with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `name`/`payload` to every handler of `event_name`
    ///
    /// Handlers run one after another in subscription order. Returns the
    /// number of handlers invoked.
    pub async fn emit(&self, event_name: &str, name: &str, payload: &Payload) -> usize {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .get(event_name)
            .cloned()
            .unwrap_or_default();

        let mut delivered = 0;
        for (id, handler) in snapshot {
            // A handler unsubscribed by an earlier one in this loop must not run
            if !self.is_subscribed(event_name, id) {
                continue;
            }
            handler.on_event(name, payload).await;
            delivered += 1;
        }
        delivered
    }

    /// Number of handlers registered for `event_name`
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners.read().get(event_name).map_or(0, Vec::len)
    }

    fn is_subscribed(&self, event_name: &str, id: SubscriptionId) -> bool {
        self.listeners
            .read()
            .get(event_name)
            .is_some_and(|list| list.iter().any(|(sid, _)| *sid == id))
    }
}

impl EventSource for EventEmitter {
    fn subscribe(&self, event_name: &str, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .write()
            .entry(event_name.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    fn unsubscribe(&self, event_name: &str, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(event_name) else {
            return false;
        };

        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        let removed = list.len() != before;

        if list.is_empty() {
            listeners.remove(event_name);
        }
        removed
    }
}
