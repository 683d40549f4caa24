//! Computed Properties
//!
//! A computed property is a named getter installed on an object. Reading it
//! runs the getter with the owning object; writing it does nothing.
//!
//! # Not Part of the Dependency Graph
//!
//! Computed properties own no registry, and their getter only ever sees the
//! owning object, so the reads it makes are untracked even when the computed
//! property itself is read inside a watcher's evaluation. The upshot:
//!
//! - reading `total` always yields a fresh result
//! - a watcher on `total` is *not* re-run when the inputs of `total` change;
//!   watch the inputs directly for that

use std::fmt;
use std::sync::Arc;

use crate::object::{Object, Property};
use crate::value::Value;

/// A computed getter. Receives the object the property is installed on.
pub type Getter = Arc<dyn Fn(&Object) -> Value + Send + Sync>;

/// A computed setter. Accepted in definitions, never called.
pub type Setter = Arc<dyn Fn(&Object, Value) + Send + Sync>;

/// How a computed property is defined.
#[derive(Clone)]
pub enum ComputedDef {
    /// Just a getter.
    Getter(Getter),
    /// A getter/setter pair. Only the getter is used: assignments to a
    /// computed property are always swallowed.
    Accessor { get: Getter, set: Setter },
}

impl ComputedDef {
    pub fn getter<F>(get: F) -> Self
    where
        F: Fn(&Object) -> Value + Send + Sync + 'static,
    {
        ComputedDef::Getter(Arc::new(get))
    }

    pub fn accessor<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&Object) -> Value + Send + Sync + 'static,
        S: Fn(&Object, Value) + Send + Sync + 'static,
    {
        ComputedDef::Accessor {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    fn into_getter(self) -> Getter {
        match self {
            ComputedDef::Getter(get) => get,
            ComputedDef::Accessor { get, .. } => get,
        }
    }
}

impl fmt::Debug for ComputedDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputedDef::Getter(_) => f.write_str("ComputedDef::Getter"),
            ComputedDef::Accessor { .. } => f.write_str("ComputedDef::Accessor"),
        }
    }
}

/// An installed computed property.
pub(crate) struct Computed {
    name: String,
    getter: Getter,
}

impl Computed {
    /// Run the getter against `owner`.
    pub(crate) fn evaluate(&self, owner: &Object) -> Value {
        tracing::trace!(name = %self.name, "evaluating computed property");
        (self.getter)(owner)
    }
}

/// Install computed properties on `root`.
///
/// Each definition replaces whatever slot `root` had under that name.
pub fn install_computed<I, K>(root: &Object, definitions: I)
where
    I: IntoIterator<Item = (K, ComputedDef)>,
    K: Into<String>,
{
    for (name, definition) in definitions {
        let name = name.into();
        tracing::debug!(name = %name, "installing computed property");
        let computed = Computed {
            name: name.clone(),
            getter: definition.into_getter(),
        };
        root.define(name, Property::Computed(Arc::new(computed)));
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
