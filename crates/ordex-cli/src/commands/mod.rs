//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use ordex_core::models::config::OrdexConfig;
use tracing::debug;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ordex")
        .join("config.json")
}

/// Load the configuration from `--config`, else from the default location
/// when it exists, else use defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<OrdexConfig> {
    if let Some(path) = config_path {
        return Ok(OrdexConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!(path = %default_path.display(), "Loading default configuration");
        Ok(OrdexConfig::from_file(&default_path)?)
    } else {
        Ok(OrdexConfig::default())
    }
}
