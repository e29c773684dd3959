//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::FlagError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &FlagError) -> String {
    match e {
        FlagError::TransientError(msg) => {
            format!("Store unavailable after retries: {}", msg)
        }
        other => other.to_string(),
    }
}
