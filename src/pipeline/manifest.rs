//! Batch manifest: a TOML list of jobs for `flagsync batch`.
//!
//! ```toml
//! [[jobs]]
//! config_file = "flags/checkout.json"
//! application = "checkout"
//! environment = "prod"
//! profile = "feature-flags"
//! # output_file = "out/checkout.merged.json"
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use super::ReconcileJob;
use crate::error::FlagError;
use crate::remote::Target;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    jobs: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    config_file: PathBuf,
    application: String,
    environment: String,
    profile: String,
    #[serde(default)]
    output_file: Option<PathBuf>,
}

/// Load and check a manifest file.
pub fn load_manifest(path: &Path) -> Result<Vec<ReconcileJob>, FlagError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        FlagError::InvalidManifest(format!("failed to read {}: {}", path.display(), e))
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_manifest(&raw, base)
}

/// Parse manifest text, resolving relative paths against `base`.
///
/// Every target must be valid and appear at most once; two jobs publishing to
/// the same target would race.
pub fn parse_manifest(raw: &str, base: &Path) -> Result<Vec<ReconcileJob>, FlagError> {
    let manifest: Manifest =
        toml::from_str(raw).map_err(|e| FlagError::InvalidManifest(e.to_string()))?;
    if manifest.jobs.is_empty() {
        return Err(FlagError::InvalidManifest("manifest lists no jobs".to_string()));
    }

    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(manifest.jobs.len());
    for (index, entry) in manifest.jobs.into_iter().enumerate() {
        let target = Target::new(entry.application, entry.environment, entry.profile);
        target
            .validate()
            .map_err(|e| FlagError::InvalidManifest(format!("job {}: {}", index + 1, e)))?;
        if !seen.insert(target.clone()) {
            return Err(FlagError::InvalidManifest(format!(
                "job {}: target {} is listed more than once",
                index + 1,
                target
            )));
        }

        let mut job = ReconcileJob::new(resolve(base, entry.config_file), target);
        if let Some(output) = entry.output_file {
            job = job.with_output_file(resolve(base, output));
        }
        jobs.push(job);
    }
    Ok(jobs)
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
