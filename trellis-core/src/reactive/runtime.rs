//! Reactive Runtime
//!
//! Per-thread settings and bookkeeping shared by every registry on a thread.
//!
//! # What It Tracks
//!
//! 1. The active `RuntimeConfig`, installed with [`Runtime::configure`].
//!
//! 2. The current notification depth: how many `Dep::notify` passes are
//!    nested on this thread's stack right now. A write inside a watcher
//!    callback starts a nested pass, so a callback that writes back to its
//!    own dependency recurses until something stops it.
//!
//! With `max_notify_depth` unset the depth is only observed, never enforced,
//! and feedback loops are the caller's problem. With a limit set, the pass
//! that would cross it fails with `NotifyDepthExceeded` instead of running.
//!
//! # Thread Safety
//!
//! Everything here is thread-local. Evaluation never suspends, so a thread's
//! depth always returns to zero once the outermost write returns.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

use crate::config::RuntimeConfig;
use crate::error::{ReactiveError, Result};

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
    static NOTIFY_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Access point for the per-thread runtime state.
pub struct Runtime;

impl Runtime {
    /// Install `config` for the current thread. Returns the previous one.
    pub fn configure(config: RuntimeConfig) -> RuntimeConfig {
        tracing::debug!(?config, "runtime configured");
        CONFIG.with(|current| current.replace(config))
    }

    /// The configuration active on the current thread.
    pub fn config() -> RuntimeConfig {
        CONFIG.with(|current| current.borrow().clone())
    }

    /// Number of notify passes currently nested on this thread.
    pub fn notify_depth() -> usize {
        NOTIFY_DEPTH.with(Cell::get)
    }

    /// Open a notify pass. The pass ends when the guard drops.
    pub(crate) fn enter_notify() -> Result<NotifyGuard> {
        let depth = Self::notify_depth() + 1;

        if let Some(limit) = Self::config().max_notify_depth {
            if depth > limit {
                tracing::warn!(depth, limit, "notification depth exceeded");
                return Err(ReactiveError::NotifyDepthExceeded { depth, limit });
            }
        }

        NOTIFY_DEPTH.with(|current| current.set(depth));
        Ok(NotifyGuard {
            _thread_bound: PhantomData,
        })
    }
}

/// Marks one open notify pass on the current thread.
pub(crate) struct NotifyGuard {
    // The guard must be dropped on the thread that created it.
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for NotifyGuard {
    fn drop(&mut self) {
        NOTIFY_DEPTH.with(|current| current.set(current.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_nest_and_unwind() {
        assert_eq!(Runtime::notify_depth(), 0);
        {
            let _outer = Runtime::enter_notify().unwrap();
            assert_eq!(Runtime::notify_depth(), 1);
            {
                let _inner = Runtime::enter_notify().unwrap();
                assert_eq!(Runtime::notify_depth(), 2);
            }
            assert_eq!(Runtime::notify_depth(), 1);
        }
        assert_eq!(Runtime::notify_depth(), 0);
    }

    #[test]
    fn limit_rejects_deeper_pass() {
        let previous = Runtime::configure(RuntimeConfig {
            max_notify_depth: Some(2),
            ..RuntimeConfig::default()
        });

        let _first = Runtime::enter_notify().unwrap();
        let _second = Runtime::enter_notify().unwrap();
        let err = Runtime::enter_notify().err().expect("third pass should fail");
        assert!(matches!(
            err,
            ReactiveError::NotifyDepthExceeded { depth: 3, limit: 2 }
        ));
        // A rejected pass leaves the depth untouched.
        assert_eq!(Runtime::notify_depth(), 2);

        Runtime::configure(previous);
    }

    #[test]
    fn configure_returns_previous() {
        let previous = Runtime::configure(RuntimeConfig::hardened());
        assert_eq!(Runtime::config(), RuntimeConfig::hardened());
        let hardened = Runtime::configure(previous.clone());
        assert_eq!(hardened, RuntimeConfig::hardened());
        assert_eq!(Runtime::config(), previous);
    }
}
