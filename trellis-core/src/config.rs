//! Runtime Configuration
//!
//! Knobs for behavior that goes beyond the plain observer graph. Every default
//! reproduces the unguarded, grow-only model.

use serde::Deserialize;

use crate::error::Result;

/// Depth limit used by [`RuntimeConfig::hardened`].
pub const DEFAULT_MAX_NOTIFY_DEPTH: usize = 100;

/// How a watcher maintains its subscriptions across re-evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingPolicy {
    /// Collect dependencies once, at construction. Later evaluations are
    /// untracked, so registries only ever grow.
    #[default]
    Static,

    /// Before each re-evaluation, leave every registry touched last time and
    /// collect afresh. Follows paths whose shape changes between runs.
    Retrack,
}

/// Per-thread runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Maximum nesting of notify passes on one thread. `None` leaves
    /// feedback loops entirely to the caller.
    pub max_notify_depth: Option<usize>,

    /// Policy used by watchers that do not pick one explicitly.
    pub tracking: TrackingPolicy,
}

impl RuntimeConfig {
    /// A configuration that turns runaway cascades into errors.
    pub fn hardened() -> Self {
        Self {
            max_notify_depth: Some(DEFAULT_MAX_NOTIFY_DEPTH),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
