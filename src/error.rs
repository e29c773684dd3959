//! Error types for flag document parsing, reconciliation and the store boundary.

use thiserror::Error;

/// Errors surfaced by flagsync operations
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid flag value for '{flag}': {reason}")]
    InvalidFlagValue { flag: String, reason: String },

    #[error(
        "No published configuration found for {0}. Pass --force-create to bootstrap a new profile."
    )]
    RemoteStateRequired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient store error: {0}")]
    TransientError(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("{report}\n{failed} of {total} jobs failed")]
    BatchFailed {
        failed: usize,
        total: usize,
        report: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlagError {
    /// Only transient store faults are worth another attempt; everything else
    /// fails the same way given the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlagError::TransientError(_))
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        FlagError::MalformedDocument(msg.into())
    }
}

impl From<config::ConfigError> for FlagError {
    fn from(err: config::ConfigError) -> Self {
        FlagError::ConfigError(err.to_string())
    }
}
