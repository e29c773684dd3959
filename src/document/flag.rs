//! Flag definitions: the structural, source-controlled half of a document.

use crate::error::FlagError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declaration of a flag's existence and constraints, independent of its value.
///
/// Only `name` and `attributes` are interpreted; every other field
/// (`description`, `_deprecation`, ...) is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Attribute constraints, e.g. `{"color": {"constraints": {"type": "string"}}}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlagDefinition {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Build a definition from one raw `flags` entry.
    ///
    /// Interpreted fields must carry their expected shape when present; a
    /// `null` there would not survive serialization.
    pub(crate) fn from_entry(flag: &str, entry: Value) -> Result<Self, FlagError> {
        let Value::Object(fields) = &entry else {
            return Err(FlagError::malformed(format!(
                "definition for flag '{}' must be an object",
                flag
            )));
        };
        for key in ["name", "attributes"] {
            if matches!(fields.get(key), Some(Value::Null)) {
                return Err(FlagError::malformed(format!(
                    "definition for flag '{}': '{}' must not be null",
                    flag, key
                )));
            }
        }
        serde_json::from_value(entry)
            .map_err(|e| FlagError::malformed(format!("definition for flag '{}': {}", flag, e)))
    }

    /// Attribute names, empty when no attributes are declared.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes
            .as_ref()
            .map(|attrs| attrs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
