//! Built-in defaults: the lowest configuration layer.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("store.root", ".flagsync/store")?
        .set_default("retry.max_attempts", 3)?
        .set_default("retry.initial_delay_ms", 200)?
        .set_default("retry.max_delay_ms", 5_000)?
        .set_default("concurrency.max_in_flight", 4)?
        .set_default("merge.always_preserve_remote_values", false)?
        .set_default("merge.force_create", false)
}
