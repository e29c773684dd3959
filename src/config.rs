//! Configuration System
//!
//! Layered runtime configuration: built-in defaults, a per-user file, workspace
//! files and `FLAGSYNC__*` environment variables, later layers winning. CLI
//! switches are applied on top by the binary.

use crate::logging::LoggingConfig;
use crate::reconcile::MergePolicy;
use crate::remote::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod defaults;
mod facade;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagsyncConfig {
    /// Where hosted configuration versions live
    #[serde(default)]
    pub store: StoreConfig,

    /// Retry settings for store calls
    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// Merge policy defaults; CLI switches can only enable more
    #[serde(default)]
    pub merge: MergePolicy,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Filesystem store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store root; relative paths resolve against the workspace root
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

fn default_store_root() -> PathBuf {
    PathBuf::from(".flagsync/store")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

impl StoreConfig {
    pub fn resolve_root(&self, workspace_root: &Path) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            workspace_root.join(&self.root)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Maximum concurrent calls to the configuration store
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_max_in_flight() -> usize {
    4
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Store(String),
    Retry(String),
    Concurrency(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Store(msg) => write!(f, "Store: {}", msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
            ValidationError::Concurrency(msg) => write!(f, "Concurrency: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FlagsyncConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.store.root.as_os_str().is_empty() {
            errors.push(ValidationError::Store("root cannot be empty".to_string()));
        }
        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }
        if self.concurrency.max_in_flight == 0 {
            errors.push(ValidationError::Concurrency(
                "max_in_flight must be at least 1".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
