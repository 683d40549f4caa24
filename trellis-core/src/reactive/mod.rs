//! Reactive Primitives
//!
//! This module implements the observer graph behind Trellis state: observed
//! slots, their dependency registries, watchers, and computed properties.
//!
//! # Concepts
//!
//! ## Observed State
//!
//! Wrapping an object redefines each of its slots as an observed slot backed
//! by a dependency registry (`Dep`). Reading an observed slot inside an
//! evaluation registers the evaluation's collector; writing a different value
//! notifies every registered subscriber.
//!
//! ## Watchers
//!
//! A Watcher evaluates a dotted path with itself as the collector, so every
//! slot it reads subscribes it. When any of them changes, the watcher
//! re-evaluates and hands the new value to its callback.
//!
//! ## Computed Properties
//!
//! Getter-backed properties installed on an object. They own no registry and
//! are not tracked.
//!
//! # Implementation Notes
//!
//! The collector is carried by an explicit `EvalContext` passed to each read
//! rather than held in ambient state. Everything runs synchronously: a write
//! notifies, watchers re-evaluate, and callbacks run before the write
//! returns. There is no batching.

mod computed;
mod context;
mod dep;
mod observe;
mod runtime;
mod subscriber;
mod watcher;

pub use computed::{install_computed, ComputedDef, Getter, Setter};
pub use context::EvalContext;
pub use dep::{Dep, DepId};
pub use observe::{observe, wrap};
pub use runtime::Runtime;
pub use subscriber::{FnSubscriber, Subscriber, SubscriberId};
pub use watcher::{create_watcher, Watcher};

pub(crate) use computed::Computed;
pub(crate) use observe::ObservedCell;
