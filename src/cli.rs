//! CLI domain: parse, route, help, output, and presentation only.
//! No reconciliation logic; single route table dispatches to the pipeline.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, wants_debug};
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_batch_json, format_batch_text, format_merge_json, format_merge_text,
    format_validate_json, format_validate_text,
};
pub use route::RunContext;
