//! View Model
//!
//! The surface a binding layer talks to: reactive data built from JSON,
//! computed properties on top of it, path-based reads and writes, and
//! watchers. A text interpolation `{{ user.name }}` maps to
//! `watch("user.name", ..)` plus an initial `get("user.name")`; a two-way
//! input binding adds `set("user.name", input)` on every edit.

use std::sync::Arc;

use crate::error::{ReactiveError, Result};
use crate::object::Object;
use crate::path::{resolve, Path};
use crate::reactive::{install_computed, wrap, ComputedDef, EvalContext, Watcher};
use crate::value::{array_index, Value};

/// Reactive data plus the operations a binding layer needs.
#[derive(Debug, Clone)]
pub struct ViewModel {
    root: Object,
}

impl ViewModel {
    /// Wrap `data`, which must be a JSON object.
    pub fn new(data: serde_json::Value) -> Result<Self> {
        match wrap(data) {
            Value::Object(root) => {
                tracing::debug!(keys = root.len(), "view model created");
                Ok(Self { root })
            }
            _ => Err(ReactiveError::DataNotObject),
        }
    }

    /// Install a computed property on the root.
    pub fn with_computed(self, name: &str, definition: ComputedDef) -> Self {
        install_computed(&self.root, [(name, definition)]);
        self
    }

    pub fn root(&self) -> &Object {
        &self.root
    }

    /// Read `path` without subscribing anyone.
    pub fn get(&self, path: &str) -> Value {
        Path::parse(path).evaluate(&self.root, &EvalContext::untracked())
    }

    /// Write `value` at `path`.
    ///
    /// The prefix of the path is read untracked; the last segment is written
    /// on whatever it leads to. Objects take any key. Arrays take a
    /// canonical index up to their length (the length itself appends).
    /// Returns whether the stored value changed.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<bool> {
        let path = Path::parse(path);
        let not_an_object = || ReactiveError::NotAnObject {
            path: path.to_string(),
        };

        let (parent, key) = path.parent_and_key().ok_or_else(not_an_object)?;
        let target = resolve(
            Value::Object(self.root.clone()),
            parent,
            &EvalContext::untracked(),
        );

        match target {
            Value::Object(object) => object.set(key, value),
            Value::Array(array) => {
                let index = array_index(key).ok_or_else(not_an_object)?;
                let value = value.into();
                let changed = !array.get(index).same(&value);
                array.set(index, value)?;
                Ok(changed)
            }
            _ => Err(not_an_object()),
        }
    }

    /// Watch `path`; `callback` runs with the fresh value after every change.
    pub fn watch<F>(&self, path: &str, callback: F) -> Arc<Watcher>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Watcher::new(&self.root, path, callback)
    }

    /// JSON snapshot of the data (computed properties excluded).
    pub fn snapshot(&self) -> serde_json::Value {
        Value::Object(self.root.clone()).to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn rejects_non_object_data() {
        assert!(matches!(
            ViewModel::new(json!([1, 2])),
            Err(ReactiveError::DataNotObject)
        ));
        assert!(matches!(
            ViewModel::new(json!(3)),
            Err(ReactiveError::DataNotObject)
        ));
    }

    #[test]
    fn binding_round_trip() {
        let vm = ViewModel::new(json!({ "form": { "name": "ada" } })).unwrap();
        let rendered = Arc::new(Mutex::new(vm.get("form.name").to_string()));
        let rendered_clone = rendered.clone();
        let _watcher = vm.watch("form.name", move |value| {
            *rendered_clone.lock() = format!("Hello {}", value);
        });

        assert_eq!(*rendered.lock(), "ada");
        assert!(vm.set("form.name", "grace").unwrap());
        assert_eq!(*rendered.lock(), "Hello grace");
    }

    #[test]
    fn set_through_non_object_fails() {
        let vm = ViewModel::new(json!({ "count": 1 })).unwrap();
        assert!(matches!(
            vm.set("count.value", 2),
            Err(ReactiveError::NotAnObject { .. })
        ));
        assert!(matches!(
            vm.set("missing.value", 2),
            Err(ReactiveError::NotAnObject { .. })
        ));
    }

    #[test]
    fn set_into_array_slot() {
        let vm = ViewModel::new(json!({ "tags": ["a", "b"] })).unwrap();
        assert!(vm.set("tags.1", "z").unwrap());
        assert!(!vm.set("tags.1", "z").unwrap());
        assert_eq!(vm.snapshot(), json!({ "tags": ["a", "z"] }));
        assert!(matches!(
            vm.set("tags.first", "z"),
            Err(ReactiveError::NotAnObject { .. })
        ));
        assert!(matches!(
            vm.set("tags.+1", "z"),
            Err(ReactiveError::NotAnObject { .. })
        ));
        assert!(vm.set("tags.2", "c").unwrap());
        assert_eq!(vm.snapshot(), json!({ "tags": ["a", "z", "c"] }));
    }

    #[test]
    fn set_past_array_end_fails_without_panicking() {
        let vm = ViewModel::new(json!({ "tags": ["a"] })).unwrap();
        assert!(matches!(
            vm.set("tags.18446744073709551615", 1),
            Err(ReactiveError::IndexOutOfRange { len: 1, .. })
        ));
        assert!(matches!(
            vm.set("tags.1000000000000", 1),
            Err(ReactiveError::IndexOutOfRange { index: 1_000_000_000_000, len: 1 })
        ));
        assert_eq!(vm.snapshot(), json!({ "tags": ["a"] }));
    }

    #[test]
    fn non_canonical_index_reads_undefined() {
        let vm = ViewModel::new(json!({ "tags": ["a", "b"] })).unwrap();
        assert_eq!(vm.get("tags.1"), Value::from("b"));
        assert!(vm.get("tags.+1").is_undefined());
        assert!(vm.get("tags.01").is_undefined());
    }

    #[test]
    fn computed_on_view_model() {
        let vm = ViewModel::new(json!({ "first": "Ada", "last": "Lovelace" }))
            .unwrap()
            .with_computed(
                "full",
                ComputedDef::getter(|root| {
                    Value::from(format!("{} {}", root.get("first"), root.get("last")))
                }),
            );

        assert_eq!(vm.get("full"), Value::from("Ada Lovelace"));
        vm.set("last", "Byron").unwrap();
        assert_eq!(vm.get("full"), Value::from("Ada Byron"));
        assert_eq!(vm.snapshot(), json!({ "first": "Ada", "last": "Byron" }));
    }
}
