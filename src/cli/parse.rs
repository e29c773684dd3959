//! CLI parse: clap types for flagsync. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flagsync - reconcile local feature-flag files with hosted configuration
#[derive(Parser)]
#[command(name = "flagsync")]
#[command(about = "Merge local feature-flag definitions with the hosted configuration they deploy to")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".", global = true)]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Reconcile one local flag file against one hosted profile
    Merge {
        /// Local flag definitions (JSON)
        #[arg(long)]
        config_file: PathBuf,
        /// Application name
        #[arg(long)]
        app_name: String,
        /// Environment name
        #[arg(long)]
        env_name: String,
        /// Configuration profile name
        #[arg(long)]
        profile_name: String,
        /// Use the local file as-is when nothing has been published yet
        #[arg(long)]
        force_create: bool,
        /// Keep hosted values for flags present on both sides
        #[arg(long)]
        always_preserve: bool,
        /// Log every per-key decision
        #[arg(long)]
        debug: bool,
        /// Merged artifact path (default: <config-file>.merged.json)
        #[arg(long)]
        output_file: Option<PathBuf>,
        /// Publish the merged document as a new hosted version
        #[arg(long, conflicts_with = "dry_run")]
        publish: bool,
        /// Reconcile and report without writing or publishing
        #[arg(long)]
        dry_run: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Reconcile every job listed in a TOML manifest
    Batch {
        /// Manifest path
        #[arg(long)]
        manifest: PathBuf,
        /// Use local files as-is for targets with nothing published yet
        #[arg(long)]
        force_create: bool,
        /// Keep hosted values for flags present on both sides
        #[arg(long)]
        always_preserve: bool,
        /// Log every per-key decision
        #[arg(long)]
        debug: bool,
        /// Publish each merged document as a new hosted version
        #[arg(long, conflicts_with = "dry_run")]
        publish: bool,
        /// Reconcile and report without writing or publishing
        #[arg(long)]
        dry_run: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Parse a local flag file and report what it contains
    Validate {
        /// Local flag definitions (JSON)
        #[arg(long)]
        config_file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
