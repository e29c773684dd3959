//! Reconciliation Engine
//!
//! Merges a local desired-state document with the remote current-state
//! document. Definitions always take the local copy; values follow the
//! [`MergePolicy`]. Keys present on only one side are always kept.
//!
//! The engine is a pure function of its inputs: no I/O, no clock, no
//! randomness. Fetching and writing belong to [`crate::pipeline`].

use crate::document::{ConfigurationDocument, PLACEHOLDER_VERSION};
use crate::error::FlagError;
use std::collections::BTreeMap;
use tracing::{debug, info};

mod policy;
mod report;

pub use policy::MergePolicy;
pub use report::{MergeReport, Resolution};

/// Output of one reconciliation: the document to publish and how it was built.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub document: ConfigurationDocument,
    pub report: MergeReport,
}

/// Merge `local` over `remote` under `policy`.
///
/// With no remote document the run is a first publish, allowed only when
/// `policy.force_create` is set. The merged version is always the placeholder.
pub fn reconcile(
    local: &ConfigurationDocument,
    remote: Option<&ConfigurationDocument>,
    policy: &MergePolicy,
) -> Result<Reconciliation, FlagError> {
    let Some(remote) = remote else {
        if !policy.force_create {
            return Err(FlagError::RemoteStateRequired(
                "the target profile".to_string(),
            ));
        }
        info!("No remote configuration, using local document as-is");
        return Ok(bootstrap(local));
    };

    let (flags, definitions) = merge_keyed(&local.flags, &remote.flags, false);
    let (values, value_resolutions) = merge_keyed(
        &local.values,
        &remote.values,
        policy.always_preserve_remote_values,
    );

    let mut metadata = local.metadata.clone();
    let mut carried_metadata = Vec::new();
    for (key, value) in &remote.metadata {
        if key.starts_with('_') && !metadata.contains_key(key) {
            metadata.insert(key.clone(), value.clone());
            carried_metadata.push(key.clone());
        }
    }

    if policy.debug {
        for (name, resolution) in &definitions {
            debug!(flag = %name, resolution = resolution.label(), "Resolved flag definition");
        }
        for (name, resolution) in &value_resolutions {
            debug!(flag = %name, resolution = resolution.label(), "Resolved flag value");
        }
        for key in &carried_metadata {
            debug!(key = %key, "Carried top-level metadata from remote");
        }
    }

    let report = MergeReport {
        bootstrap: false,
        previous_version: None,
        definitions,
        values: value_resolutions,
        carried_metadata,
    };

    info!(
        flags = flags.len(),
        values = values.len(),
        added = report.added_flags().len(),
        remote_only = report.remote_only_flags().len(),
        preserved = report.preserved_values().len(),
        "Reconciled configuration"
    );

    Ok(Reconciliation {
        document: ConfigurationDocument {
            flags,
            values,
            version: Some(PLACEHOLDER_VERSION.to_string()),
            metadata,
        },
        report,
    })
}

fn bootstrap(local: &ConfigurationDocument) -> Reconciliation {
    let report = MergeReport {
        bootstrap: true,
        previous_version: None,
        definitions: local
            .flags
            .keys()
            .map(|k| (k.clone(), Resolution::LocalOnly))
            .collect(),
        values: local
            .values
            .keys()
            .map(|k| (k.clone(), Resolution::LocalOnly))
            .collect(),
        carried_metadata: Vec::new(),
    };
    let document = ConfigurationDocument {
        version: Some(PLACEHOLDER_VERSION.to_string()),
        ..local.clone()
    };
    Reconciliation { document, report }
}

/// Union of two keyed maps. Keys on both sides take the remote entry when
/// `prefer_remote`, the local entry otherwise.
fn merge_keyed<T: Clone>(
    local: &BTreeMap<String, T>,
    remote: &BTreeMap<String, T>,
    prefer_remote: bool,
) -> (BTreeMap<String, T>, BTreeMap<String, Resolution>) {
    let mut merged = BTreeMap::new();
    let mut resolutions = BTreeMap::new();

    for (name, local_entry) in local {
        let (entry, resolution) = match remote.get(name) {
            None => (local_entry, Resolution::LocalOnly),
            Some(remote_entry) if prefer_remote => (remote_entry, Resolution::RemoteWins),
            Some(_) => (local_entry, Resolution::LocalWins),
        };
        merged.insert(name.clone(), entry.clone());
        resolutions.insert(name.clone(), resolution);
    }

    for (name, remote_entry) in remote {
        if !local.contains_key(name) {
            merged.insert(name.clone(), remote_entry.clone());
            resolutions.insert(name.clone(), Resolution::RemoteOnly);
        }
    }

    (merged, resolutions)
}
