//! Merged artifact: where the reconciled document is written before publishing.

use crate::document::ConfigurationDocument;
use crate::error::FlagError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MERGED_SUFFIX: &str = ".merged.json";
const TMP_SUFFIX: &str = ".tmp";

/// `<config-file>.merged.json`, next to the input.
pub fn default_output_path(config_file: &Path) -> PathBuf {
    let mut name = config_file.as_os_str().to_os_string();
    name.push(MERGED_SUFFIX);
    PathBuf::from(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Previously written artifact, if one exists and still parses.
pub fn read_existing(path: &Path) -> Option<ConfigurationDocument> {
    let raw = fs::read_to_string(path).ok()?;
    match ConfigurationDocument::parse(&raw) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable merged artifact");
            None
        }
    }
}

/// True when the flag set or any flag's attribute names differ.
///
/// Value changes are not structural.
pub fn structural_change(previous: Option<&ConfigurationDocument>, merged: &ConfigurationDocument) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    let previous_flags: BTreeSet<&String> = previous.flags.keys().collect();
    let merged_flags: BTreeSet<&String> = merged.flags.keys().collect();
    if previous_flags != merged_flags {
        return true;
    }
    merged.flags.iter().any(|(name, def)| {
        previous
            .flags
            .get(name)
            .map_or(true, |old| old.attribute_names() != def.attribute_names())
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Write `bytes` to `path` unless the file already holds exactly those bytes.
pub fn write_if_changed(path: &Path, bytes: &str) -> Result<WriteOutcome, FlagError> {
    if let Ok(existing) = fs::read(path) {
        if existing == bytes.as_bytes() {
            info!(path = %path.display(), "Merged artifact unchanged");
            return Ok(WriteOutcome::Unchanged);
        }
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    // Write beside the target then rename, so readers never see a partial file.
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    info!(path = %path.display(), "Wrote merged configuration");
    Ok(WriteOutcome::Written)
}
