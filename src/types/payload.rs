//! Structured event payloads
//!
//! Hosts hand reporters a [`Payload`]: JSON-like data whose objects are
//! shared handles. Because an [`ObjectRef`] can be stored inside itself (or
//! inside one of its descendants), payloads are able to express cyclic
//! graphs, which the serializer has to render safely.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Number, Value};

/// A structured event payload
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Payload>),
    /// Shared object, possibly part of a cycle
    Object(ObjectRef),
}

impl Payload {
    /// Create a payload holding a new, empty shared object
    pub fn object() -> (Self, ObjectRef) {
        let object = ObjectRef::new();
        (Payload::Object(object.clone()), object)
    }

    /// Get the shared object if this payload is one
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Payload::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Get the string value if this payload is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a field of an object payload
    pub fn get(&self, key: &str) -> Option<Payload> {
        self.as_object().and_then(|object| object.get(key))
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Null,
            Value::Bool(b) => Payload::Bool(b),
            Value::Number(n) => Payload::Number(n),
            Value::String(s) => Payload::String(s),
            Value::Array(items) => Payload::Array(items.into_iter().map(Payload::from).collect()),
            Value::Object(map) => {
                let object = ObjectRef::new();
                for (key, value) in map {
                    object.insert(key, Payload::from(value));
                }
                Payload::Object(object)
            }
        }
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::String(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::String(value)
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Payload::Bool(value)
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Payload::Number(value.into())
    }
}

impl From<u64> for Payload {
    fn from(value: u64) -> Self {
        Payload::Number(value.into())
    }
}

impl From<f64> for Payload {
    /// Non-finite floats have no JSON form and become `Null`
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Payload::Null, Payload::Number)
    }
}

/// Shared, mutable object with insertion-ordered fields
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<RwLock<Vec<(String, Payload)>>>);

impl ObjectRef {
    /// Create a new empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing value in place
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Payload>) {
        let key = key.into();
        let value = value.into();
        let mut fields = self.0.write();
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => fields.push((key, value)),
        }
    }

    /// Get a clone of a field value
    pub fn get(&self, key: &str) -> Option<Payload> {
        self.0
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether the object has no fields
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the fields in insertion order
    pub fn entries(&self) -> Vec<(String, Payload)> {
        self.0.read().clone()
    }

    /// Identity of the underlying allocation, used for cycle detection
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Whether two handles point at the same object
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    // Fields are not printed: a self-referencing object would recurse forever
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("fields", &self.len())
            .finish()
    }
}
