//! Configuration file loading

use crate::config::LoamConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[cfg(feature = "toml")]
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML syntax or shape error
    #[cfg(feature = "yaml")]
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or shape error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension not recognised (or format feature disabled)
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Result alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Loads [`LoamConfig`] from files or strings
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and parse a config file.
    ///
    /// Relative plugin folders are resolved against the file's directory.
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<LoamConfig> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::from_content(&content, format)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        debug!(
            path = %path.display(),
            plugins_enabled = config.plugins_enabled(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return the default configuration
    pub async fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<LoamConfig> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Self::load_from_file(path).await
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(LoamConfig::default())
        }
    }

    /// Parse configuration text in the given format
    pub fn from_content(content: &str, format: ConfigFormat) -> ConfigResult<LoamConfig> {
        if content.trim().is_empty() {
            return Ok(LoamConfig::default());
        }

        match format {
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => Ok(toml::from_str(content)?),
            #[cfg(feature = "yaml")]
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            ConfigFormat::Json => Ok(serde_json::from_str(content)?),
            #[allow(unreachable_patterns)]
            other => Err(ConfigError::UnsupportedFormat(format!("{:?}", other))),
        }
    }

    /// `<config dir>/loam/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("loam").join("config.toml"))
    }
}
