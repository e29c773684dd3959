//! Remote configuration store boundary
//!
//! Read-only fetch and publish contracts for the delivery service, keyed by an
//! (application, environment, profile) [`Target`]. The engine never calls
//! these directly; [`crate::pipeline`] does, wrapping each call in
//! [`retry::with_retry`].

use crate::document::ConfigurationDocument;
use crate::error::FlagError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

pub mod directory;
pub mod memory;
pub mod retry;

pub use directory::DirectoryStore;
pub use memory::InMemoryStore;
pub use retry::RetryPolicy;

/// The (application, environment, profile) triple a document is published to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    pub application: String,
    pub environment: String,
    pub profile: String,
}

impl Target {
    pub fn new(
        application: impl Into<String>,
        environment: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            environment: environment.into(),
            profile: profile.into(),
        }
    }

    /// Reject empty components and anything that could escape a path segment.
    pub fn validate(&self) -> Result<(), FlagError> {
        for (field, value) in [
            ("application", &self.application),
            ("environment", &self.environment),
            ("profile", &self.profile),
        ] {
            if value.trim().is_empty() {
                return Err(FlagError::ConfigError(format!("{} name cannot be empty", field)));
            }
            if value.contains(['/', '\\']) || value == "." || value == ".." {
                return Err(FlagError::ConfigError(format!(
                    "{} name '{}' is not a valid identifier",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.application, self.environment, self.profile)
    }
}

/// Opaque identifier of a hosted configuration version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionHandle(pub String);

impl fmt::Display for VersionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The latest hosted document for a target and the version it was stored as.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    pub document: ConfigurationDocument,
    pub version: VersionHandle,
}

/// Read side of the delivery service.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Latest hosted configuration, or `None` when the profile exists but has
    /// no versions yet. Missing containers may surface as [`FlagError::NotFound`].
    async fn fetch_current(&self, target: &Target) -> Result<Option<RemoteSnapshot>, FlagError>;
}

/// Write side of the delivery service.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create the target's containers if absent and store `document` as a new
    /// hosted version. Does not roll the version out.
    async fn publish(
        &self,
        document: &ConfigurationDocument,
        target: &Target,
    ) -> Result<VersionHandle, FlagError>;
}

/// A store that can both fetch and publish.
pub trait ConfigurationStore: RemoteFetcher + Publisher {}

impl<T: RemoteFetcher + Publisher> ConfigurationStore for T {}

/// Fetch with `NotFound` folded into "no remote state yet".
pub async fn fetch_or_none<F: RemoteFetcher + ?Sized>(
    fetcher: &F,
    target: &Target,
) -> Result<Option<RemoteSnapshot>, FlagError> {
    match fetcher.fetch_current(target).await {
        Ok(snapshot) => Ok(snapshot),
        Err(FlagError::NotFound(what)) => {
            warn!(triple = %target, missing = %what, "No existing configuration found");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
