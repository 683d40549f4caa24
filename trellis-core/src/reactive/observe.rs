//! Observable State
//!
//! Wrapping turns plain state into reactive state *in place*: every data slot
//! of every reachable object is redefined as an observed slot holding the
//! same value plus a fresh [`Dep`]. Nothing is copied, so handles the caller
//! already holds see the change.
//!
//! # How Observed Slots Work
//!
//! 1. A read registers the context's collector with the slot's registry,
//!    then returns the current value.
//!
//! 2. A write compares the new value with the stored one by strict identity.
//!    Identical: nothing happens. Different: store, then notify.
//!
//! # Limitations
//!
//! Wrapping happens once, up front. A value written into a slot later is
//! stored as-is; if it is a plain object, its own slots stay plain until
//! `observe` is called on it (or on an ancestor) again. Arrays are walked so
//! objects inside them get wrapped, but array elements are never observed.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::context::EvalContext;
use super::dep::Dep;
use crate::error::Result;
use crate::object::{ObjectId, Property};
use crate::value::Value;

/// Value cell behind an observed slot.
pub(crate) struct ObservedCell {
    value: RwLock<Value>,
    dep: Arc<Dep>,
}

impl ObservedCell {
    pub(crate) fn new(value: Value) -> Self {
        Self {
            value: RwLock::new(value),
            dep: Arc::new(Dep::new()),
        }
    }

    /// Tracked read.
    pub(crate) fn get(&self, ctx: &EvalContext) -> Value {
        ctx.track(&self.dep);
        self.value.read().clone()
    }

    /// Untracked read.
    pub(crate) fn peek(&self) -> Value {
        self.value.read().clone()
    }

    /// Store `value` and notify if it differs from the current one.
    pub(crate) fn set(&self, value: Value) -> Result<bool> {
        {
            let mut current = self.value.write();
            if current.same(&value) {
                return Ok(false);
            }
            *current = value;
        }
        // The write lock is gone before any subscriber runs.
        self.dep.notify()?;
        Ok(true)
    }

    pub(crate) fn dep(&self) -> &Arc<Dep> {
        &self.dep
    }
}

impl fmt::Debug for ObservedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedCell")
            .field("value", &self.peek())
            .field("dep", &self.dep)
            .finish()
    }
}

/// Make `value` reactive in place.
///
/// Primitives are left alone. Objects have each data slot wrapped
/// depth-first and then redefined as an observed slot. Slots that are
/// already observed keep their registry (their current value is still
/// walked); computed slots are skipped. Each object is visited once per
/// call, so cyclic graphs terminate.
pub fn observe(value: &Value) {
    observe_value(value, &mut HashSet::new());
}

/// Build reactive state from JSON.
pub fn wrap(data: serde_json::Value) -> Value {
    let value = Value::from_json(data);
    observe(&value);
    value
}

fn observe_value(value: &Value, visited: &mut HashSet<ObjectId>) {
    match value {
        Value::Object(object) => {
            if !visited.insert(object.id()) {
                return;
            }
            for (key, property) in object.properties() {
                match property {
                    Property::Data(current) => {
                        observe_value(&current, visited);
                        object.define(key, Property::Observed(Arc::new(ObservedCell::new(current))));
                    }
                    Property::Observed(cell) => observe_value(&cell.peek(), visited),
                    Property::Computed(_) => {}
                }
            }
        }
        Value::Array(array) => {
            for item in array.to_vec() {
                observe_value(&item, visited);
            }
        }
        _ => {}
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;
    use crate::reactive::{FnSubscriber, Subscriber};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Arc<dyn Subscriber>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let subscriber: Arc<dyn Subscriber> = Arc::new(FnSubscriber::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        (count, subscriber)
    }

    fn root(value: &Value) -> &Object {
        value.as_object().expect("object")
    }

    #[test]
    fn observe_primitive_is_noop() {
        let value = Value::from(3);
        observe(&value);
        assert_eq!(value, Value::from(3));
    }

    #[test]
    fn wraps_nested_objects_in_place() {
        let state = Value::from_json(json!({ "x": { "y": 1 }, "z": 2 }));
        let inner = root(&state).get("x");

        observe(&state);

        assert!(root(&state).is_observed("x"));
        assert!(root(&state).is_observed("z"));
        // The handle taken before wrapping sees the change.
        assert!(inner.as_object().unwrap().is_observed("y"));
        assert!(root(&state).get("x").same(&inner));
    }

    #[test]
    fn wraps_objects_inside_arrays() {
        let state = wrap(json!({ "items": [{ "done": false }, 4] }));
        let items = root(&state).get("items");
        let first = items.as_array().unwrap().get(0);
        assert!(first.as_object().unwrap().is_observed("done"));
    }

    #[test]
    fn tracked_read_subscribes_collector() {
        let state = wrap(json!({ "count": 1 }));
        let (_, subscriber) = counter();

        let ctx = EvalContext::collecting(subscriber);
        assert_eq!(root(&state).get_with("count", &ctx), Value::from(1));
        assert_eq!(root(&state).subscriber_count("count"), Some(1));

        // Untracked reads leave the registry alone.
        root(&state).get("count");
        assert_eq!(root(&state).subscriber_count("count"), Some(1));
    }

    #[test]
    fn write_notifies_only_on_change() {
        let state = wrap(json!({ "count": 1 }));
        let (count, subscriber) = counter();
        root(&state).get_with("count", &EvalContext::collecting(subscriber));

        assert!(root(&state).set("count", 2).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(!root(&state).set("count", 2).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(root(&state).set("count", 3).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn structurally_equal_object_counts_as_change() {
        let state = wrap(json!({ "user": { "name": "ada" } }));
        let (count, subscriber) = counter();
        root(&state).get_with("user", &EvalContext::collecting(subscriber));

        let lookalike = Value::from_json(json!({ "name": "ada" }));
        assert!(root(&state).set("user", lookalike).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn assigned_object_is_not_wrapped() {
        let state = wrap(json!({ "user": null }));
        root(&state)
            .set("user", Value::from_json(json!({ "name": "ada" })))
            .unwrap();

        let user = root(&state).get("user");
        assert!(!user.as_object().unwrap().is_observed("name"));

        // Explicitly observing again picks it up without replacing the
        // existing registry on `user`.
        let (_, subscriber) = counter();
        root(&state).get_with("user", &EvalContext::collecting(subscriber));
        observe(&state);
        assert!(user.as_object().unwrap().is_observed("name"));
        assert_eq!(root(&state).subscriber_count("user"), Some(1));
    }

    #[test]
    fn cyclic_graph_terminates() {
        let object = Object::new();
        object.set("me", object.clone()).unwrap();
        object.set("n", 1).unwrap();

        observe(&Value::from(object.clone()));
        assert!(object.is_observed("me"));
        assert!(object.is_observed("n"));
    }
}
