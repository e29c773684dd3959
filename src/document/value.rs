//! Flag values: the operationally mutable half of a document.

use crate::error::FlagError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Runtime state of a flag within one environment.
///
/// `enabled` is the only interpreted field. Anything an operator attached
/// alongside it (notes, variant attributes, ...) lives in `metadata` and is
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl FlagValue {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Build a value from one raw `values` entry.
    pub(crate) fn from_entry(flag: &str, entry: &Value) -> Result<Self, FlagError> {
        let fields = entry.as_object().ok_or_else(|| {
            FlagError::malformed(format!("value for flag '{}' must be an object", flag))
        })?;

        let mut metadata = fields.clone();
        let enabled = match metadata.remove("enabled") {
            None => None,
            Some(Value::Bool(b)) => Some(b),
            Some(other) => {
                return Err(FlagError::InvalidFlagValue {
                    flag: flag.to_string(),
                    reason: format!("'enabled' must be a boolean, got {}", other),
                })
            }
        };

        Ok(Self { enabled, metadata })
    }
}
