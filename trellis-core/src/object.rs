//! Objects
//!
//! An `Object` is a shared, insertion-ordered bag of named property slots.
//! Each slot is one of three kinds:
//!
//! - **Data**: a plain value. Reads and writes go straight to it.
//! - **Observed**: a value cell paired with a dependency registry. Reads
//!   subscribe the active collector, writes that change the value notify.
//! - **Computed**: a getter supplied by the user. Writes are swallowed.
//!
//! Objects start out with data slots only. [`observe`](crate::observe)
//! turns them into observed slots in place, which is how plain state becomes
//! reactive without being copied.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::Result;
use crate::reactive::{Computed, EvalContext, ObservedCell};
use crate::value::Value;

/// Unique identifier for an object, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A property slot.
#[derive(Clone)]
pub(crate) enum Property {
    Data(Value),
    Observed(Arc<ObservedCell>),
    Computed(Arc<Computed>),
}

struct ObjectInner {
    id: ObjectId,
    properties: RwLock<IndexMap<String, Property>>,
}

/// Shared handle to an object. Clones refer to the same object.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

/// Non-owning handle to an object.
#[derive(Clone)]
pub struct WeakObject {
    inner: Weak<ObjectInner>,
}

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.inner.upgrade().map(|inner| Object { inner })
    }
}

impl Object {
    /// Create an empty object.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                id: ObjectId::next(),
                properties: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Build a plain object from a JSON map, recursively.
    pub fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter()
            .map(|(key, value)| (key, Value::from_json(value)))
            .collect()
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    /// Read a property without subscribing anyone.
    pub fn get(&self, key: &str) -> Value {
        self.get_with(key, &EvalContext::untracked())
    }

    /// Read a property inside an evaluation.
    ///
    /// Observed slots register the context's collector (if any) before
    /// returning their value. Computed slots run their getter against this
    /// object; the getter's own reads are untracked. Missing keys yield
    /// `Undefined`.
    pub fn get_with(&self, key: &str, ctx: &EvalContext) -> Value {
        match self.property(key) {
            Some(Property::Data(value)) => value,
            Some(Property::Observed(cell)) => cell.get(ctx),
            Some(Property::Computed(computed)) => computed.evaluate(self),
            None => Value::Undefined,
        }
    }

    /// Write a property. Returns whether the stored value changed.
    ///
    /// - observed slot: stores and notifies only if the new value is not
    ///   identical to the old one
    /// - data slot, or absent key: stores plainly, nobody is notified (a key
    ///   added after wrapping is not reactive)
    /// - computed slot: ignored
    ///
    /// The new value is not wrapped, even if it is an object.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        match self.property(key) {
            Some(Property::Observed(cell)) => cell.set(value),
            Some(Property::Computed(_)) => {
                tracing::trace!(key = %key, "assignment to computed property ignored");
                Ok(false)
            }
            Some(Property::Data(current)) => {
                let changed = !current.same(&value);
                self.define(key.to_string(), Property::Data(value));
                Ok(changed)
            }
            None => {
                self.define(key.to_string(), Property::Data(value));
                Ok(true)
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.properties.read().contains_key(key)
    }

    /// All property names in insertion order, computed ones included.
    pub fn keys(&self) -> Vec<String> {
        self.inner.properties.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.properties.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.properties.read().is_empty()
    }

    /// Whether `key` is backed by a dependency registry.
    pub fn is_observed(&self, key: &str) -> bool {
        matches!(self.property(key), Some(Property::Observed(_)))
    }

    pub fn is_computed(&self, key: &str) -> bool {
        matches!(self.property(key), Some(Property::Computed(_)))
    }

    /// Number of subscriptions held by `key`'s registry, counting duplicates.
    /// `None` if `key` is not observed.
    pub fn subscriber_count(&self, key: &str) -> Option<usize> {
        match self.property(key) {
            Some(Property::Observed(cell)) => Some(cell.dep().len()),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Clone of one slot. The lock is released before the caller uses it, so
    /// getters and notifications never run under it.
    pub(crate) fn property(&self, key: &str) -> Option<Property> {
        self.inner.properties.read().get(key).cloned()
    }

    /// Snapshot of every slot, in order.
    pub(crate) fn properties(&self) -> Vec<(String, Property)> {
        self.inner
            .properties
            .read()
            .iter()
            .map(|(key, property)| (key.clone(), property.clone()))
            .collect()
    }

    /// Define (or redefine) a slot.
    pub(crate) fn define(&self, key: String, property: Property) {
        self.inner.properties.write().insert(key, property);
    }

    /// Current values of data and observed slots, read untracked. Computed
    /// slots are not enumerable.
    pub(crate) fn enumerable_entries(&self) -> Vec<(String, Value)> {
        self.properties()
            .into_iter()
            .filter_map(|(key, property)| match property {
                Property::Data(value) => Some((key, value)),
                Property::Observed(cell) => Some((key, cell.peek())),
                Property::Computed(_) => None,
            })
            .collect()
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let object = Object::new();
        {
            let mut properties = object.inner.properties.write();
            for (key, value) in iter {
                properties.insert(key.into(), Property::Data(value));
            }
        }
        object
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.inner.id)
            .field("keys", &self.keys())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain(json: serde_json::Value) -> Object {
        match Value::from_json(json) {
            Value::Object(object) => object,
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn plain_object_reads_and_writes() {
        let object = plain(json!({ "a": 1, "b": "two" }));
        assert_eq!(object.get("a"), Value::from(1));
        assert_eq!(object.get("b"), Value::from("two"));
        assert!(object.get("missing").is_undefined());

        assert!(object.set("a", 5).unwrap());
        assert!(!object.set("a", 5).unwrap());
        assert_eq!(object.get("a"), Value::from(5));
        assert!(!object.is_observed("a"));
    }

    #[test]
    fn set_on_absent_key_inserts_plain_slot() {
        let object = Object::new();
        assert!(object.set("late", true).unwrap());
        assert!(object.contains_key("late"));
        assert!(!object.is_observed("late"));
        assert_eq!(object.subscriber_count("late"), None);
    }

    #[test]
    fn keys_keep_insertion_order() {
        let object = plain(json!({ "z": 1, "a": 2, "m": 3 }));
        assert_eq!(object.keys(), vec!["z", "a", "m"]);
        assert_eq!(object.len(), 3);
    }

    #[test]
    fn clones_share_state() {
        let object = Object::new();
        let alias = object.clone();
        alias.set("x", 1).unwrap();
        assert_eq!(object.get("x"), Value::from(1));
        assert!(object.ptr_eq(&alias));
        assert!(!object.ptr_eq(&Object::new()));
    }

    #[test]
    fn weak_handle_does_not_keep_object_alive() {
        let object = Object::new();
        let weak = object.downgrade();
        assert!(weak.upgrade().is_some());
        drop(object);
        assert!(weak.upgrade().is_none());
    }
}
