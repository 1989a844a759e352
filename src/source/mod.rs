//! Host event source boundary
//!
//! Reporters consume events through [`EventSource`]: they subscribe a
//! handler to the [`REPORT_EVENT`] channel on start and unsubscribe it on
//! stop or on a stream failure. [`EventEmitter`] is an in-process
//! implementation suitable for embedding and tests.

mod emitter;
mod filter;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::Payload;

pub use emitter::EventEmitter;
pub use filter::{EventFilter, TagSelector};

/// Channel name reporters subscribe to
pub const REPORT_EVENT: &str = "report";

/// Identifies one subscription on an event source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receives forwarded events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Called once per forwarded event, in emission order
    async fn on_event(&self, name: &str, payload: &Payload);
}

/// Something reporters can subscribe to
pub trait EventSource: Send + Sync {
    /// Register `handler` for `event_name`
    fn subscribe(&self, event_name: &str, handler: Arc<dyn EventHandler>) -> SubscriptionId;

    /// Remove a subscription. No invocation of the handler starts after
    /// this returns. Returns `false` if the subscription was unknown.
    fn unsubscribe(&self, event_name: &str, id: SubscriptionId) -> bool;
}
