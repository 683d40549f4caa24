//! Error Types
//!
//! The reactive core prefers silent degradation: wrapping a primitive, reading
//! a missing path segment and assigning to a computed property are all
//! non-events. What remains here are the failures a caller can act on.

use thiserror::Error;

/// Errors produced by the reactive core.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// A notification cascade nested deeper than the configured limit.
    ///
    /// Only raised when `RuntimeConfig::max_notify_depth` is set.
    #[error("notification depth exceeded: depth {depth} is over the limit of {limit}")]
    NotifyDepthExceeded { depth: usize, limit: usize },

    /// One or more subscribers failed while a registry was notifying.
    ///
    /// Every subscriber was still given the chance to update.
    #[error("{} subscriber(s) failed during notification", .failures.len())]
    Propagation { failures: Vec<ReactiveError> },

    /// A watcher was notified after its root object had been dropped.
    #[error("root object of watcher `{path}` has been dropped")]
    RootDropped { path: String },

    /// A write went through a path whose prefix is not an object.
    #[error("cannot write `{path}`: the parent value is not an object")]
    NotAnObject { path: String },

    /// An array write addressed an element past its end.
    #[error("index {index} is out of range for an array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// View-model data must be a mapping at the top level.
    #[error("view-model data must be a JSON object")]
    DataNotObject,

    /// Configuration could not be parsed.
    #[error("invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;
