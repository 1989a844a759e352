//! Cycle-safe JSON rendering of payloads

use serde_json::{Map, Value};

use super::EventSerializer;
use crate::types::{ObjectRef, Payload};

/// Marker written in place of a reference back to the root object
pub const CYCLE_MARKER_ROOT: &str = "[Circular ~]";

/// Build the marker for a reference to the ancestor at `path`
///
/// The root is `[Circular ~]`; deeper ancestors append their key path,
/// e.g. `[Circular ~.request.headers]`.
pub fn cycle_marker(path: &[String]) -> String {
    if path.is_empty() {
        CYCLE_MARKER_ROOT.to_string()
    } else {
        format!("[Circular ~.{}]", path.join("."))
    }
}

/// Convert a payload into a JSON value, replacing cycles with markers
pub fn to_json_value(payload: &Payload) -> Value {
    let mut walker = CycleWalker::default();
    walker.convert(payload)
}

/// Compact single-line JSON serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeJsonSerializer;

impl SafeJsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl EventSerializer for SafeJsonSerializer {
    fn serialize(&self, _event: &str, payload: &Payload) -> String {
        // Value's Display is the compact serializer and cannot fail
        to_json_value(payload).to_string()
    }
}

/// Depth-first walk that remembers which objects are on the current path
#[derive(Default)]
struct CycleWalker {
    /// (object address, length of `path` when the object was entered)
    ancestors: Vec<(usize, usize)>,
    /// Keys from the root to the value being converted
    path: Vec<String>,
}

impl CycleWalker {
    fn convert(&mut self, payload: &Payload) -> Value {
        match payload {
            Payload::Null => Value::Null,
            Payload::Bool(b) => Value::Bool(*b),
            Payload::Number(n) => Value::Number(n.clone()),
            Payload::String(s) => Value::String(s.clone()),
            Payload::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    self.path.push(index.to_string());
                    values.push(self.convert(item));
                    self.path.pop();
                }
                Value::Array(values)
            }
            Payload::Object(object) => self.convert_object(object),
        }
    }

    fn convert_object(&mut self, object: &ObjectRef) -> Value {
        let addr = object.addr();

        // Checked before reading the object, so a self-reference never re-locks it
        if let Some(&(_, depth)) = self.ancestors.iter().find(|(a, _)| *a == addr) {
            return Value::String(cycle_marker(&self.path[..depth]));
        }

        self.ancestors.push((addr, self.path.len()));
        let mut map = Map::new();
        for (key, value) in object.entries() {
            self.path.push(key.clone());
            let converted = self.convert(&value);
            self.path.pop();
            map.insert(key, converted);
        }
        self.ancestors.pop();

        Value::Object(map)
    }
}
