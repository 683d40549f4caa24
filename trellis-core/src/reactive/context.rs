//! Evaluation Context
//!
//! The evaluation context carries the *active collector*: the subscriber, if
//! any, that every observed read should register. It replaces an ambient
//! "currently evaluating" slot with a value handed explicitly to each read,
//! so collection is scoped to one evaluation and cannot leak into another.
//!
//! # Rules
//!
//! - A context holds at most one collector, fixed when it is created.
//! - `EvalContext::untracked()` has none; reads through it subscribe nobody.
//! - The context records every registry it subscribed its collector to, in
//!   read order and with repeats, so a watcher can later leave them again.

use std::cell::RefCell;
use std::sync::{Arc, Weak};

use super::dep::Dep;
use super::subscriber::{Subscriber, SubscriberId};

/// Per-evaluation dependency collection state.
pub struct EvalContext {
    collector: Option<Arc<dyn Subscriber>>,
    /// Registries the collector was added to during this evaluation.
    dependencies: RefCell<Vec<Weak<Dep>>>,
}

impl EvalContext {
    /// A context that collects nothing.
    pub fn untracked() -> Self {
        Self {
            collector: None,
            dependencies: RefCell::new(Vec::new()),
        }
    }

    /// A context whose reads subscribe `collector`.
    pub fn collecting(collector: Arc<dyn Subscriber>) -> Self {
        Self {
            collector: Some(collector),
            dependencies: RefCell::new(Vec::new()),
        }
    }

    /// Check if reads through this context register a collector.
    pub fn is_collecting(&self) -> bool {
        self.collector.is_some()
    }

    /// Get the collector's ID, if any.
    pub fn collector(&self) -> Option<SubscriberId> {
        self.collector.as_ref().map(|collector| collector.id())
    }

    /// Register the collector with `dep`.
    ///
    /// Called by observed slots on every read. Without a collector this does
    /// nothing.
    pub fn track(&self, dep: &Arc<Dep>) {
        if let Some(collector) = &self.collector {
            dep.add_subscriber(Arc::clone(collector));
            self.dependencies.borrow_mut().push(Arc::downgrade(dep));
        }
    }

    /// Number of registrations made so far, repeats included.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.borrow().len()
    }

    /// Finish the evaluation and hand back the registries it touched.
    pub(crate) fn into_dependencies(self) -> Vec<Weak<Dep>> {
        self.dependencies.into_inner()
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::untracked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::FnSubscriber;

    fn noop() -> Arc<dyn Subscriber> {
        Arc::new(FnSubscriber::new(|| Ok(())))
    }

    #[test]
    fn untracked_context_registers_nothing() {
        let dep = Arc::new(Dep::new());
        let ctx = EvalContext::untracked();

        assert!(!ctx.is_collecting());
        assert!(ctx.collector().is_none());

        ctx.track(&dep);
        assert!(dep.is_empty());
        assert_eq!(ctx.dependency_count(), 0);
    }

    #[test]
    fn collecting_context_subscribes_collector() {
        let subscriber = noop();
        let id = subscriber.id();
        let ctx = EvalContext::collecting(subscriber);

        assert!(ctx.is_collecting());
        assert_eq!(ctx.collector(), Some(id));

        let a = Arc::new(Dep::new());
        let b = Arc::new(Dep::new());
        ctx.track(&a);
        ctx.track(&b);
        ctx.track(&a);

        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);

        let touched = ctx.into_dependencies();
        assert_eq!(touched.len(), 3);
        assert!(touched[0].upgrade().is_some_and(|dep| Arc::ptr_eq(&dep, &a)));
    }

    #[test]
    fn separate_contexts_do_not_share_collectors() {
        let first = EvalContext::collecting(noop());
        let second = EvalContext::collecting(noop());
        assert_ne!(first.collector(), second.collector());

        let dep = Arc::new(Dep::new());
        first.track(&dep);
        assert_eq!(first.dependency_count(), 1);
        assert_eq!(second.dependency_count(), 0);
    }
}
