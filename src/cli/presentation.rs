//! CLI presentation: text and json formatters per command family.

mod merge;
mod validate;

pub use merge::{
    format_batch_json, format_batch_text, format_merge_json, format_merge_text,
};
pub use validate::{format_validate_json, format_validate_text};
