//! Config loading facade: assembles the layers in precedence order.

use super::defaults::builder_with_defaults;
use super::sources::{add_environment, global_file, workspace_file};
use super::FlagsyncConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`FlagsyncConfig`] from defaults, files and environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then workspace files, then `FLAGSYNC__*` variables.
    pub fn load(workspace_root: &Path) -> Result<FlagsyncConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = add_environment(builder)?;
        let config: FlagsyncConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Loaded layered configuration");
        Ok(config)
    }

    /// Defaults, then exactly `path`, then `FLAGSYNC__*` variables.
    pub fn load_from_file(path: &Path) -> Result<FlagsyncConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = add_environment(builder)?;
        let config: FlagsyncConfig = builder.build()?.try_deserialize()?;
        debug!(config_path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Location of the per-user configuration file, if one can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
