//! Merge policy: the per-invocation knobs that steer reconciliation.

use serde::{Deserialize, Serialize};

/// Conflict policy for one reconciliation run.
///
/// Built once per invocation from CLI flags layered over configuration
/// defaults. `debug` only raises log verbosity; it never changes a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePolicy {
    /// Keep the remote value in full for any flag valued on both sides.
    #[serde(default)]
    pub always_preserve_remote_values: bool,

    /// Treat a missing remote configuration as a first publish instead of an error.
    #[serde(default)]
    pub force_create: bool,

    #[serde(default)]
    pub debug: bool,
}

impl MergePolicy {
    pub fn preserving_remote() -> Self {
        Self {
            always_preserve_remote_values: true,
            ..Self::default()
        }
    }

    pub fn with_force_create(mut self, force_create: bool) -> Self {
        self.force_create = force_create;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Combine with CLI switches; a switch can turn an option on but never off.
    pub fn overlay(self, always_preserve: bool, force_create: bool, debug: bool) -> Self {
        Self {
            always_preserve_remote_values: self.always_preserve_remote_values || always_preserve,
            force_create: self.force_create || force_create,
            debug: self.debug || debug,
        }
    }
}
