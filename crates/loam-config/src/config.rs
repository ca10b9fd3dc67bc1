//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-folder plugin load timeout
pub const DEFAULT_PLUGIN_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoamConfig {
    /// Opt-in features that are not yet stable
    #[serde(default)]
    pub experimental: Option<ExperimentalConfig>,

    /// Markdown parser options
    #[serde(default)]
    pub parser: ParserConfig,
}

/// Experimental feature block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentalConfig {
    /// Plugins loaded from local folders
    #[serde(default)]
    pub local_plugins: Option<LocalPluginsConfig>,
}

/// Local plugin configuration
///
/// Plugins run arbitrary code, so they only load when `enabled` is explicitly
/// `true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPluginsConfig {
    /// Whether plugins load at all (absent means disabled)
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Plugin folders, in application order
    #[serde(default)]
    pub plugin_folders: Vec<PathBuf>,

    /// Per-folder load timeout in milliseconds
    #[serde(default)]
    pub load_timeout_ms: Option<u64>,
}

impl LocalPluginsConfig {
    /// `true` only when `enabled` is explicitly set to `true`
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// Configured load timeout, or [`DEFAULT_PLUGIN_LOAD_TIMEOUT`]
    pub fn load_timeout(&self) -> Duration {
        self.load_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PLUGIN_LOAD_TIMEOUT)
    }
}

/// Markdown parser options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
    /// Extension appended to link targets written without one (`[[idea]]` → `idea.md`)
    #[serde(default = "default_note_extension")]
    pub default_note_extension: String,
}

fn default_note_extension() -> String {
    ".md".to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_note_extension: default_note_extension(),
        }
    }
}

impl LoamConfig {
    /// The `experimental.localPlugins` block, if present
    pub fn local_plugins(&self) -> Option<&LocalPluginsConfig> {
        self.experimental.as_ref()?.local_plugins.as_ref()
    }

    /// Whether local plugins should be loaded
    pub fn plugins_enabled(&self) -> bool {
        self.local_plugins().is_some_and(LocalPluginsConfig::is_enabled)
    }

    /// Configured plugin folders, empty when the block is absent
    pub fn plugin_folders(&self) -> &[PathBuf] {
        self.local_plugins()
            .map(|p| p.plugin_folders.as_slice())
            .unwrap_or(&[])
    }

    /// Config enabling local plugins from `folders`
    pub fn with_plugin_folders<I, P>(folders: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            experimental: Some(ExperimentalConfig {
                local_plugins: Some(LocalPluginsConfig {
                    enabled: Some(true),
                    plugin_folders: folders.into_iter().map(Into::into).collect(),
                    load_timeout_ms: None,
                }),
            }),
            parser: ParserConfig::default(),
        }
    }

    /// Resolve relative plugin folders against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let Some(plugins) = self
            .experimental
            .as_mut()
            .and_then(|e| e.local_plugins.as_mut())
        else {
            return;
        };

        for folder in &mut plugins.plugin_folders {
            if folder.is_relative() {
                *folder = base.join(&*folder);
            }
        }
    }
}
