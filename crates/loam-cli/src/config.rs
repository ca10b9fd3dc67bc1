//! Resolving the configuration the CLI runs with

use anyhow::{Context, Result};
use loam_config::{ConfigLoader, LoamConfig};
use std::path::Path;
use tracing::debug;

/// Load `explicit` if given (it must exist), else the default location if present
pub async fn load(explicit: Option<&Path>) -> Result<LoamConfig> {
    if let Some(path) = explicit {
        return ConfigLoader::load_from_file(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    match ConfigLoader::default_path() {
        Some(path) => ConfigLoader::load_or_default(&path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            debug!("No config directory, using defaults");
            Ok(LoamConfig::default())
        }
    }
}
