//! Subscriber types for the reactive system.
//!
//! A Subscriber is anything a dependency registry can notify. Watchers are
//! the subscribers the binding layer creates; `FnSubscriber` adapts a plain
//! closure for everything else.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Used to find a subscriber's entries in a registry when it leaves, and to
/// label log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that reacts when a property it depends on changes.
pub trait Subscriber: Send + Sync {
    /// The subscriber's unique ID.
    fn id(&self) -> SubscriberId;

    /// Called by a registry after the property it guards changed.
    ///
    /// A failure is reported to the registry, which keeps notifying the
    /// remaining subscribers.
    fn update(&self) -> Result<()>;
}

/// A subscriber backed by a closure.
pub struct FnSubscriber {
    id: SubscriberId,
    update: Box<dyn Fn() -> Result<()> + Send + Sync>,
}

impl FnSubscriber {
    /// Create a new subscriber with the given update callback.
    pub fn new<F>(update: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            update: Box::new(update),
        }
    }
}

impl Subscriber for FnSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn update(&self) -> Result<()> {
        (self.update)()
    }
}
