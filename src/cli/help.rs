//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Stable command name used in log fields.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Merge { .. } => "merge",
        Commands::Batch { .. } => "batch",
        Commands::Validate { .. } => "validate",
    }
}

/// True when the command asked for per-key reconciliation logging.
pub fn wants_debug(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Merge { debug: true, .. } | Commands::Batch { debug: true, .. }
    )
}
