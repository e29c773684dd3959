//! CLI route: single route table and run context. Dispatches to the pipeline and presentation.

use crate::config::{ConfigLoader, FlagsyncConfig};
use crate::error::FlagError;
use crate::pipeline::{load_manifest, summarize_local, Pipeline, ReconcileJob, RunOptions};
use crate::remote::{ConfigurationStore, DirectoryStore, Target};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_batch_json, format_batch_text, format_merge_json, format_merge_text,
    format_validate_json, format_validate_text,
};
use crate::cli::command_name;

/// Runtime context for CLI execution: workspace, loaded config and the store.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: FlagsyncConfig,
    store: Arc<dyn ConfigurationStore>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, FlagError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        let store_root = config.store.resolve_root(&workspace_root);
        debug!(store_root = %store_root.display(), "Using directory store");
        Self::with_store(workspace_root, config, Arc::new(DirectoryStore::new(store_root)))
    }

    /// Create run context around an already-built store.
    pub fn with_store(
        workspace_root: PathBuf,
        config: FlagsyncConfig,
        store: Arc<dyn ConfigurationStore>,
    ) -> Result<Self, FlagError> {
        config.validate().map_err(|errors| {
            FlagError::ConfigError(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        Ok(Self {
            workspace_root,
            config,
            store,
        })
    }

    pub fn config(&self) -> &FlagsyncConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, FlagError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, FlagError> {
        match command {
            Commands::Merge {
                config_file,
                app_name,
                env_name,
                profile_name,
                force_create,
                always_preserve,
                debug,
                output_file,
                publish,
                dry_run,
                format,
            } => {
                let mut job = ReconcileJob::new(
                    self.resolve(config_file),
                    Target::new(app_name.as_str(), env_name.as_str(), profile_name.as_str()),
                );
                if let Some(output) = output_file {
                    job = job.with_output_file(self.resolve(output));
                }
                let pipeline = self.pipeline(*always_preserve, *force_create, *debug);
                let options = RunOptions {
                    publish: *publish,
                    dry_run: *dry_run,
                };
                let runtime = tokio::runtime::Runtime::new()?;
                let outcome = runtime.block_on(pipeline.run(&job, options))?;
                Ok(if format == "json" {
                    format_merge_json(&outcome)
                } else {
                    format_merge_text(&outcome)
                })
            }
            Commands::Batch {
                manifest,
                force_create,
                always_preserve,
                debug,
                publish,
                dry_run,
                format,
            } => {
                let jobs = load_manifest(&self.resolve(manifest))?;
                let pipeline = self.pipeline(*always_preserve, *force_create, *debug);
                let options = RunOptions {
                    publish: *publish,
                    dry_run: *dry_run,
                };
                let runtime = tokio::runtime::Runtime::new()?;
                let results = runtime.block_on(pipeline.run_all(&jobs, options));

                let report = if format == "json" {
                    format_batch_json(&jobs, &results)
                } else {
                    format_batch_text(&jobs, &results)
                };
                let failed = results.iter().filter(|r| r.is_err()).count();
                if failed > 0 {
                    return Err(FlagError::BatchFailed {
                        failed,
                        total: results.len(),
                        report,
                    });
                }
                Ok(report)
            }
            Commands::Validate {
                config_file,
                format,
            } => {
                let summary = summarize_local(&self.resolve(config_file))?;
                Ok(if format == "json" {
                    format_validate_json(&summary)
                } else {
                    format_validate_text(&summary)
                })
            }
        }
    }

    /// Config defaults overlaid with the command's switches.
    fn pipeline(&self, always_preserve: bool, force_create: bool, debug: bool) -> Pipeline {
        let policy = self
            .config
            .merge
            .overlay(always_preserve, force_create, debug);
        Pipeline::new(
            Arc::clone(&self.store),
            policy,
            self.config.retry,
            self.config.concurrency.max_in_flight,
        )
    }

    /// Relative paths on the command line resolve against the workspace root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}
