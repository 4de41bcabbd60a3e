//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use ecogep_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::Path;

/// Load layered configuration: defaults, then the optional file, then the
/// environment, then command-line overrides
pub fn load_config(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_path {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides).context("Invalid command-line configuration")?;

    tracing::debug!(
        base_url = %config.base_url.value,
        vision_model = %config.vision_model.value,
        chat_model = %config.chat_model.value,
        "Configuration loaded"
    );

    Ok(config)
}
