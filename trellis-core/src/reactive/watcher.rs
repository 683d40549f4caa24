//! Watcher Implementation
//!
//! A Watcher follows one dotted path on a root object and calls back with the
//! fresh value whenever a property it read changes.
//!
//! # How Watchers Work
//!
//! 1. On creation, the watcher evaluates its path inside a collecting
//!    context with itself as the collector. Every observed slot read along
//!    the path (`a`, `a.b`, `a.b.c` for `"a.b.c"`) adds the watcher to its
//!    registry. The result is stored; the callback is *not* called.
//!
//! 2. When one of those slots changes, its registry calls `update`, which
//!    re-evaluates the path and hands the result to the callback.
//!
//! # Tracking Policies
//!
//! Under `TrackingPolicy::Static` (the default) re-evaluation is untracked:
//! subscriptions are exactly those made at creation, and registries only
//! grow. That is all a fixed property chain needs. A path whose shape changes
//! between runs (an intermediate value switches objects) is under-subscribed
//! on the new branch.
//!
//! `TrackingPolicy::Retrack` instead leaves every registry it joined last time
//! and collects again on each update. Static chains behave identically under
//! both policies.
//!
//! # Ownership
//!
//! Registries hold watchers strongly; a watcher holds its root weakly and its
//! registries weakly, so no reference cycle forms. A watcher notified after
//! its root is gone reports `RootDropped`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::context::EvalContext;
use super::dep::Dep;
use super::runtime::Runtime;
use super::subscriber::{Subscriber, SubscriberId};
use crate::config::TrackingPolicy;
use crate::error::{ReactiveError, Result};
use crate::object::{Object, WeakObject};
use crate::path::Path;
use crate::value::Value;

type Callback = Box<dyn Fn(&Value) + Send + Sync>;

/// A path subscription on a root object.
///
/// # Example
///
/// ```rust,ignore
/// let state = wrap(json!({ "count": 1 }));
/// let root = state.as_object().unwrap();
///
/// let watcher = Watcher::new(root, "count", |value| {
///     println!("count is now {}", value);
/// });
///
/// root.set("count", 2)?;  // Prints: "count is now 2"
/// ```
pub struct Watcher {
    id: SubscriberId,

    /// Handle to ourselves, used to install the watcher as a collector.
    this: Weak<Watcher>,

    root: WeakObject,
    path: Path,
    policy: TrackingPolicy,
    callback: Callback,

    /// Result of the latest evaluation.
    value: RwLock<Value>,

    /// Registries joined by the latest collecting evaluation.
    dependencies: Mutex<Vec<Weak<Dep>>>,

    disposed: AtomicBool,
    update_count: AtomicUsize,
}

impl Watcher {
    /// Create a watcher using the thread's configured tracking policy.
    pub fn new<F>(root: &Object, path: &str, callback: F) -> Arc<Self>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Self::with_policy(root, path, Runtime::config().tracking, callback)
    }

    /// Create a watcher with an explicit tracking policy.
    pub fn with_policy<F>(
        root: &Object,
        path: &str,
        policy: TrackingPolicy,
        callback: F,
    ) -> Arc<Self>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let watcher = Arc::new_cyclic(|this| Self {
            id: SubscriberId::new(),
            this: this.clone(),
            root: root.downgrade(),
            path: Path::parse(path),
            policy,
            callback: Box::new(callback),
            value: RwLock::new(Value::Undefined),
            dependencies: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
            update_count: AtomicUsize::new(0),
        });

        let initial = watcher.collect(root);
        *watcher.value.write() = initial;

        tracing::debug!(
            watcher = watcher.id.raw(),
            path = %watcher.path,
            ?policy,
            dependencies = watcher.dependency_count(),
            "watcher created"
        );
        watcher
    }

    /// Evaluate the path with this watcher as the collector, and remember
    /// which registries were joined.
    fn collect(&self, root: &Object) -> Value {
        let Some(this) = self.this.upgrade() else {
            return self.path.evaluate(root, &EvalContext::untracked());
        };
        let ctx = EvalContext::collecting(this);
        let value = self.path.evaluate(root, &ctx);
        *self.dependencies.lock() = ctx.into_dependencies();
        value
    }

    /// Leave every registry joined last time.
    fn leave_dependencies(&self) {
        let previous = std::mem::take(&mut *self.dependencies.lock());
        for dep in previous.iter().filter_map(Weak::upgrade) {
            dep.remove_subscriber(self.id);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> TrackingPolicy {
        self.policy
    }

    /// Result of the latest evaluation.
    pub fn value(&self) -> Value {
        self.value.read().clone()
    }

    /// Number of updates processed so far (creation excluded).
    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    /// Number of registrations made by the latest collecting evaluation,
    /// repeats included.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.lock().len()
    }

    /// Stop reacting. The watcher leaves the registries it joined most
    /// recently and ignores any notification still in flight.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.leave_dependencies();
            tracing::debug!(watcher = self.id.raw(), path = %self.path, "watcher disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Subscriber for Watcher {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn update(&self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }

        let root = self.root.upgrade().ok_or_else(|| ReactiveError::RootDropped {
            path: self.path.to_string(),
        })?;

        let fresh = match self.policy {
            TrackingPolicy::Static => self.path.evaluate(&root, &EvalContext::untracked()),
            TrackingPolicy::Retrack => {
                self.leave_dependencies();
                self.collect(&root)
            }
        };

        *self.value.write() = fresh.clone();
        self.update_count.fetch_add(1, Ordering::SeqCst);

        // No lock is held here: the callback may write back into the state.
        (self.callback)(&fresh);
        Ok(())
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("policy", &self.policy)
            .field("update_count", &self.update_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Create a watcher on `path` under `root`. See [`Watcher::new`].
pub fn create_watcher<F>(root: &Object, path: &str, on_change: F) -> Arc<Watcher>
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    Watcher::new(root, path, on_change)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
