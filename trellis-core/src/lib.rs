//! Trellis Core
//!
//! This crate provides the reactive state engine behind the Trellis
//! view-binding layer. It implements:
//!
//! - Observable state: plain nested data made reactive in place
//! - Per-property dependency registries
//! - Watchers that discover their dependencies by evaluating a path
//! - Computed (getter-backed) properties
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value` / `object`: the dynamic data model (values, shared objects, arrays)
//! - `reactive`: registries, observed slots, watchers, computed properties
//! - `path`: dotted property paths and their evaluation
//! - `vm`: the view-model facade a binding layer talks to
//! - `config` / `error`: runtime settings and the crate error type
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use trellis_core::ViewModel;
//!
//! let vm = ViewModel::new(json!({ "count": 1 }))?;
//!
//! // Watch a path
//! let _watcher = vm.watch("count", |value| println!("count: {}", value));
//!
//! // Writes notify synchronously
//! vm.set("count", 2)?;  // Prints: "count: 2"
//! vm.set("count", 2)?;  // Same value, nothing printed
//! ```

pub mod config;
pub mod error;
pub mod object;
pub mod path;
pub mod reactive;
pub mod value;
pub mod vm;

pub use config::{RuntimeConfig, TrackingPolicy};
pub use error::{ReactiveError, Result};
pub use object::{Object, ObjectId, WeakObject};
pub use path::Path;
pub use reactive::{create_watcher, install_computed, observe, wrap, ComputedDef, Watcher};
pub use value::{Array, Value};
pub use vm::ViewModel;
