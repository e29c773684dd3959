//! Process-local configuration store.
//!
//! Keeps every published version in memory. Transient faults can be injected
//! to exercise retry paths without a network.

use super::{Publisher, RemoteFetcher, RemoteSnapshot, Target, VersionHandle};
use crate::document::ConfigurationDocument;
use crate::error::FlagError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
pub struct InMemoryStore {
    versions: RwLock<HashMap<Target, Vec<ConfigurationDocument>>>,
    fetch_faults: AtomicU32,
    publish_faults: AtomicU32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `document` as if it had been published out-of-band.
    pub fn seed(&self, target: &Target, document: ConfigurationDocument) -> VersionHandle {
        let mut versions = self.versions.write();
        let history = versions.entry(target.clone()).or_default();
        history.push(document);
        VersionHandle(history.len().to_string())
    }

    /// Make the next `count` fetches fail with a transient error.
    pub fn fail_next_fetches(&self, count: u32) {
        self.fetch_faults.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` publishes fail with a transient error.
    pub fn fail_next_publishes(&self, count: u32) {
        self.publish_faults.store(count, Ordering::SeqCst);
    }

    /// Number of hosted versions for `target`.
    pub fn version_count(&self, target: &Target) -> usize {
        self.versions.read().get(target).map_or(0, Vec::len)
    }

    pub fn latest(&self, target: &Target) -> Option<ConfigurationDocument> {
        self.versions
            .read()
            .get(target)
            .and_then(|history| history.last().cloned())
    }
}

fn take_fault(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl RemoteFetcher for InMemoryStore {
    async fn fetch_current(&self, target: &Target) -> Result<Option<RemoteSnapshot>, FlagError> {
        if take_fault(&self.fetch_faults) {
            return Err(FlagError::TransientError(format!(
                "injected fetch fault for {}",
                target
            )));
        }
        let versions = self.versions.read();
        let Some(history) = versions.get(target) else {
            return Err(FlagError::NotFound(format!("profile {}", target)));
        };
        Ok(history.last().map(|document| RemoteSnapshot {
            document: document.clone(),
            version: VersionHandle(history.len().to_string()),
        }))
    }
}

#[async_trait]
impl Publisher for InMemoryStore {
    async fn publish(
        &self,
        document: &ConfigurationDocument,
        target: &Target,
    ) -> Result<VersionHandle, FlagError> {
        if take_fault(&self.publish_faults) {
            return Err(FlagError::TransientError(format!(
                "injected publish fault for {}",
                target
            )));
        }
        Ok(self.seed(target, document.clone()))
    }
}
