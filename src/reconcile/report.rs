//! Merge report: where every key in a merged document came from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How one flag or value key was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Present only in the local document.
    LocalOnly,
    /// Present only in the remote document; carried through unchanged.
    RemoteOnly,
    /// Present in both; the local copy was kept.
    LocalWins,
    /// Present in both; the remote copy was kept.
    RemoteWins,
}

impl Resolution {
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::LocalOnly => "added",
            Resolution::RemoteOnly => "carried",
            Resolution::LocalWins => "local",
            Resolution::RemoteWins => "preserved",
        }
    }
}

/// Per-key provenance for one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// True when no remote state existed and local was taken as-is.
    pub bootstrap: bool,
    /// Version the remote store reported for the document we merged against.
    pub previous_version: Option<String>,
    pub definitions: BTreeMap<String, Resolution>,
    pub values: BTreeMap<String, Resolution>,
    /// Top-level metadata keys taken from the remote document.
    pub carried_metadata: Vec<String>,
}

impl MergeReport {
    fn definitions_with(&self, resolution: Resolution) -> Vec<&str> {
        select(&self.definitions, resolution)
    }

    fn values_with(&self, resolution: Resolution) -> Vec<&str> {
        select(&self.values, resolution)
    }

    /// Flags defined locally that the remote had never seen.
    pub fn added_flags(&self) -> Vec<&str> {
        self.definitions_with(Resolution::LocalOnly)
    }

    /// Flags that exist only remotely (created out-of-band or removed from source).
    pub fn remote_only_flags(&self) -> Vec<&str> {
        self.definitions_with(Resolution::RemoteOnly)
    }

    /// Values where the remote copy beat the local one.
    pub fn preserved_values(&self) -> Vec<&str> {
        self.values_with(Resolution::RemoteWins)
    }

    /// Values where the local copy replaced a remote one.
    pub fn overridden_values(&self) -> Vec<&str> {
        self.values_with(Resolution::LocalWins)
    }

    pub fn remote_only_values(&self) -> Vec<&str> {
        self.values_with(Resolution::RemoteOnly)
    }
}

fn select(map: &BTreeMap<String, Resolution>, resolution: Resolution) -> Vec<&str> {
    map.iter()
        .filter(|(_, r)| **r == resolution)
        .map(|(k, _)| k.as_str())
        .collect()
}
