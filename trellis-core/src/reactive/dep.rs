//! Dependency Registry
//!
//! A `Dep` is the list of subscribers interested in one observed property.
//! Every observed slot owns exactly one, for its whole lifetime.
//!
//! # Semantics
//!
//! - Subscribers are kept in registration order.
//! - Registration does not de-duplicate: a subscriber added twice is
//!   notified twice.
//! - `notify` runs synchronously on the caller's stack. It walks a snapshot
//!   of the list, so subscribers that join or leave during the pass take
//!   effect from the next pass on.
//! - A failing subscriber is logged and collected; the pass continues.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::runtime::Runtime;
use super::subscriber::{Subscriber, SubscriberId};
use crate::error::{ReactiveError, Result};

/// Unique identifier for a registry, used in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepId(u64);

impl DepId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Ordered collection of the subscribers of one property.
pub struct Dep {
    id: DepId,
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
}

impl Dep {
    pub fn new() -> Self {
        Self {
            id: DepId::next(),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> DepId {
        self.id
    }

    /// Append a subscriber.
    pub fn add_subscriber(&self, subscriber: Arc<dyn Subscriber>) {
        tracing::trace!(
            dep = self.id.0,
            subscriber = subscriber.id().raw(),
            "subscriber added"
        );
        self.subscribers.write().push(subscriber);
    }

    /// Remove every entry for `id`. Returns how many were removed.
    pub fn remove_subscriber(&self, id: SubscriberId) -> usize {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id() != id);
        before - subscribers.len()
    }

    /// Call `update` on every subscriber, in registration order.
    ///
    /// Returns `Propagation` with every collected failure if any subscriber
    /// failed, or `NotifyDepthExceeded` (without notifying anyone) if the
    /// runtime's depth limit would be crossed.
    pub fn notify(&self) -> Result<()> {
        let subscribers = self.subscribers.read().clone();
        if subscribers.is_empty() {
            return Ok(());
        }

        let _depth = Runtime::enter_notify()?;
        tracing::debug!(
            dep = self.id.0,
            subscribers = subscribers.len(),
            depth = Runtime::notify_depth(),
            "notifying subscribers"
        );

        let mut failures = Vec::new();
        for subscriber in subscribers {
            if let Err(err) = subscriber.update() {
                tracing::warn!(
                    dep = self.id.0,
                    subscriber = subscriber.id().raw(),
                    error = %err,
                    "subscriber failed to update"
                );
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReactiveError::Propagation { failures })
        }
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.id)
            .field("subscriber_count", &self.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::FnSubscriber;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Arc<dyn Subscriber> {
        let log = log.clone();
        Arc::new(FnSubscriber::new(move || {
            log.lock().push(name);
            Ok(())
        }))
    }

    #[test]
    fn notify_runs_in_registration_order() {
        let dep = Dep::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dep.add_subscriber(recorder(&log, "first"));
        dep.add_subscriber(recorder(&log, "second"));
        dep.add_subscriber(recorder(&log, "third"));

        dep.notify().unwrap();
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicates_are_notified_twice() {
        let dep = Dep::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let subscriber = recorder(&log, "twice");

        dep.add_subscriber(subscriber.clone());
        dep.add_subscriber(subscriber);
        assert_eq!(dep.len(), 2);

        dep.notify().unwrap();
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn failure_does_not_starve_later_subscribers() {
        let dep = Dep::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dep.add_subscriber(recorder(&log, "before"));
        dep.add_subscriber(Arc::new(FnSubscriber::new(|| {
            Err(ReactiveError::RootDropped { path: "gone".into() })
        })));
        dep.add_subscriber(recorder(&log, "after"));

        let err = dep.notify().unwrap_err();
        match err {
            ReactiveError::Propagation { failures } => assert_eq!(failures.len(), 1),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(*log.lock(), vec!["before", "after"]);
    }

    #[test]
    fn remove_subscriber_drops_all_entries() {
        let dep = Dep::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let subscriber = recorder(&log, "gone");
        let id = subscriber.id();

        dep.add_subscriber(subscriber.clone());
        dep.add_subscriber(recorder(&log, "kept"));
        dep.add_subscriber(subscriber);

        assert_eq!(dep.remove_subscriber(id), 2);
        assert_eq!(dep.len(), 1);

        dep.notify().unwrap();
        assert_eq!(*log.lock(), vec!["kept"]);
    }

    #[test]
    fn empty_registry_notifies_nobody() {
        let dep = Dep::new();
        assert!(dep.is_empty());
        dep.notify().unwrap();
    }
}
