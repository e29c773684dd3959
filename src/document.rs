//! Flag Document Model
//!
//! Typed representation of a feature-flag configuration document: flag
//! definitions, flag values, a version marker and any extra top-level fields.
//! Parsing validates shape; serialization is canonical (sorted keys, two-space
//! indent, trailing newline) so equal documents always produce equal bytes.

use crate::error::FlagError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

mod flag;
mod value;

pub use flag::FlagDefinition;
pub use value::FlagValue;

/// Version string the delivery service schema expects on every document we
/// write. It is a placeholder, not the hosted version number.
pub const PLACEHOLDER_VERSION: &str = "1";

const FLAGS_KEY: &str = "flags";
const VALUES_KEY: &str = "values";
const VERSION_KEY: &str = "version";

/// A complete flag configuration: the unit of reconciliation and publication.
///
/// `flags` and `values` are keyed independently; a name may appear in either
/// one without the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationDocument {
    pub flags: BTreeMap<String, FlagDefinition>,
    pub values: BTreeMap<String, FlagValue>,
    pub version: Option<String>,
    /// Top-level fields other than flags, values and version.
    pub metadata: Map<String, Value>,
}

/// Names present on one side of a document but not the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Unpaired {
    pub flags_without_values: Vec<String>,
    pub values_without_flags: Vec<String>,
}

impl Unpaired {
    pub fn is_empty(&self) -> bool {
        self.flags_without_values.is_empty() && self.values_without_flags.is_empty()
    }
}

impl ConfigurationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, key: impl Into<String>, definition: FlagDefinition) -> Self {
        self.flags.insert(key.into(), definition);
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: FlagValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Parse a raw JSON document.
    ///
    /// Missing `flags` or `values` default to empty mappings; an explicit
    /// `null` for either is malformed. A numeric
    /// `version` is kept as its string form.
    pub fn parse(raw: &str) -> Result<Self, FlagError> {
        let root: Value = serde_json::from_str(raw)
            .map_err(|e| FlagError::malformed(format!("invalid JSON: {}", e)))?;
        Self::from_value(root)
    }

    pub fn from_value(root: Value) -> Result<Self, FlagError> {
        let Value::Object(mut fields) = root else {
            return Err(FlagError::malformed("top level must be a JSON object"));
        };

        let flags = match fields.remove(FLAGS_KEY) {
            None => BTreeMap::new(),
            Some(Value::Object(entries)) => parse_flags(entries)?,
            Some(_) => return Err(FlagError::malformed("'flags' must be an object")),
        };

        let values = match fields.remove(VALUES_KEY) {
            None => BTreeMap::new(),
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(name, entry)| Ok((name.clone(), FlagValue::from_entry(name, entry)?)))
                .collect::<Result<_, FlagError>>()?,
            Some(_) => return Err(FlagError::malformed("'values' must be an object")),
        };

        let version = match fields.remove(VERSION_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(FlagError::malformed(format!(
                    "'version' must be a string or number, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            flags,
            values,
            version,
            metadata: fields,
        })
    }

    /// JSON form with a string `version`, falling back to the placeholder.
    pub fn to_value(&self) -> Result<Value, FlagError> {
        let mut root = self.metadata.clone();
        root.insert(FLAGS_KEY.to_string(), to_json(&self.flags)?);
        root.insert(VALUES_KEY.to_string(), to_json(&self.values)?);
        root.insert(
            VERSION_KEY.to_string(),
            Value::String(
                self.version
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER_VERSION.to_string()),
            ),
        );
        Ok(Value::Object(root))
    }

    /// Canonical serialized bytes.
    pub fn serialize(&self) -> Result<String, FlagError> {
        let mut out = serde_json::to_string_pretty(&self.to_value()?)
            .map_err(|e| FlagError::malformed(format!("failed to serialize document: {}", e)))?;
        out.push('\n');
        Ok(out)
    }

    /// BLAKE3 digest (hex) of the canonical serialization.
    pub fn fingerprint(&self) -> Result<String, FlagError> {
        let bytes = self.serialize()?;
        Ok(hex::encode(blake3::hash(bytes.as_bytes()).as_bytes()))
    }

    /// Names with a definition but no value, and a value but no definition.
    pub fn unpaired(&self) -> Unpaired {
        let flag_names: BTreeSet<&String> = self.flags.keys().collect();
        let value_names: BTreeSet<&String> = self.values.keys().collect();
        Unpaired {
            flags_without_values: flag_names
                .difference(&value_names)
                .map(|s| s.to_string())
                .collect(),
            values_without_flags: value_names
                .difference(&flag_names)
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn parse_flags(entries: Map<String, Value>) -> Result<BTreeMap<String, FlagDefinition>, FlagError> {
    let mut flags = BTreeMap::new();
    for (name, entry) in entries {
        let definition = FlagDefinition::from_entry(&name, entry)?;
        flags.insert(name, definition);
    }
    Ok(flags)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, FlagError> {
    serde_json::to_value(value)
        .map_err(|e| FlagError::malformed(format!("failed to serialize document: {}", e)))
}
