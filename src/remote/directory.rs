//! Filesystem-hosted configuration store
//!
//! Stores hosted versions as canonical JSON files:
//! `{root}/{application}/{environment}/{profile}/versions/{n}.json`
//!
//! Version numbers start at 1 and grow by one per publish. Publishing creates
//! any missing application, environment or profile directory; fetching
//! reports a missing one as [`FlagError::NotFound`].

use super::{Publisher, RemoteFetcher, RemoteSnapshot, Target, VersionHandle};
use crate::document::ConfigurationDocument;
use crate::error::FlagError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const VERSIONS_DIR: &str = "versions";

pub struct DirectoryStore {
    root: PathBuf,
    // Serializes version allocation between publishes from this process.
    publish_lock: Mutex<()>,
}

impl DirectoryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            publish_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_dir(&self, target: &Target) -> PathBuf {
        self.root
            .join(&target.application)
            .join(&target.environment)
            .join(&target.profile)
    }

    fn versions_dir(&self, target: &Target) -> PathBuf {
        self.profile_dir(target).join(VERSIONS_DIR)
    }

    /// Check each container level so the error names the missing one.
    fn ensure_exists(&self, target: &Target) -> Result<(), FlagError> {
        let app_dir = self.root.join(&target.application);
        if !app_dir.is_dir() {
            return Err(FlagError::NotFound(format!(
                "application '{}'",
                target.application
            )));
        }
        if !app_dir.join(&target.environment).is_dir() {
            return Err(FlagError::NotFound(format!(
                "environment '{}'",
                target.environment
            )));
        }
        if !self.profile_dir(target).is_dir() {
            return Err(FlagError::NotFound(format!(
                "configuration profile '{}'",
                target.profile
            )));
        }
        Ok(())
    }

    /// Hosted version numbers in ascending order.
    pub fn list_versions(&self, target: &Target) -> Result<Vec<u64>, FlagError> {
        let dir = self.versions_dir(target);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir).map_err(map_io)? {
            let path = entry.map_err(map_io)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                Some(n) => versions.push(n),
                None => debug!(path = %path.display(), "Skipping non-version file"),
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    fn version_path(&self, target: &Target, version: u64) -> PathBuf {
        self.versions_dir(target).join(format!("{}.json", version))
    }
}

/// Interrupted or timed-out I/O is worth retrying; anything else is not.
fn map_io(err: io::Error) -> FlagError {
    match err.kind() {
        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
            FlagError::TransientError(err.to_string())
        }
        _ => FlagError::Io(err),
    }
}

#[async_trait]
impl RemoteFetcher for DirectoryStore {
    async fn fetch_current(&self, target: &Target) -> Result<Option<RemoteSnapshot>, FlagError> {
        target.validate()?;
        self.ensure_exists(target)?;
        let Some(latest) = self.list_versions(target)?.last().copied() else {
            info!(triple = %target, "No configuration versions found");
            return Ok(None);
        };

        let raw = fs::read_to_string(self.version_path(target, latest)).map_err(map_io)?;
        let document = ConfigurationDocument::parse(&raw)?;
        info!(triple = %target, version = latest, "Retrieved latest configuration version");
        Ok(Some(RemoteSnapshot {
            document,
            version: VersionHandle(latest.to_string()),
        }))
    }
}

#[async_trait]
impl Publisher for DirectoryStore {
    async fn publish(
        &self,
        document: &ConfigurationDocument,
        target: &Target,
    ) -> Result<VersionHandle, FlagError> {
        target.validate()?;
        let bytes = document.serialize()?;

        let _guard = self.publish_lock.lock();
        let dir = self.versions_dir(target);
        fs::create_dir_all(&dir).map_err(map_io)?;

        let next = self.list_versions(target)?.last().map_or(1, |n| n + 1);
        let path = self.version_path(target, next);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes.as_bytes()).map_err(map_io)?;
        fs::rename(&tmp, &path).map_err(map_io)?;

        info!(triple = %target, version = next, "Published configuration version");
        Ok(VersionHandle(next.to_string()))
    }
}
