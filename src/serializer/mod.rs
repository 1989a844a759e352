//! Event serialization
//!
//! A serializer turns one event payload into one self-contained line of
//! text. It is infallible: anything that cannot be represented is replaced
//! with a marker rather than reported as an error.

mod safe_json;

pub use safe_json::{cycle_marker, to_json_value, SafeJsonSerializer, CYCLE_MARKER_ROOT};

use crate::types::Payload;

/// Converts a payload into a single line of text (without the trailing newline)
pub trait EventSerializer: Send + Sync {
    /// Serialize one event. `event` is the host's event name.
    fn serialize(&self, event: &str, payload: &Payload) -> String;
}
