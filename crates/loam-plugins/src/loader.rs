//! Extension loader
//!
//! Turns the `experimental.localPlugins` configuration into extension
//! records. Folders load concurrently, each bounded by the configured
//! timeout; a folder that fails is logged and skipped without affecting the
//! others. Results keep the configured folder order.

use crate::error::{ExtensionError, ExtensionResult};
use crate::lua::LuaModuleLoader;
use crate::record::ExtensionRecord;
use async_trait::async_trait;
use futures::future::join_all;
use loam_config::LoamConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Loads the plugin found at one configured path
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load_module(&self, path: &Path) -> ExtensionResult<ExtensionRecord>;
}

/// Outcome of loading every configured folder
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Loaded records, in configured folder order
    pub extensions: Vec<ExtensionRecord>,
    /// Folders that produced no record, in configured folder order
    pub skipped: Vec<ExtensionError>,
}

impl LoadReport {
    /// Failures, excluding plugins switched off by their manifest
    pub fn failures(&self) -> impl Iterator<Item = &ExtensionError> {
        self.skipped.iter().filter(|e| !e.is_disabled())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

pub struct ExtensionLoader {
    loader: Arc<dyn ModuleLoader>,
}

impl Default for ExtensionLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExtensionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionLoader").finish_non_exhaustive()
    }
}

impl ExtensionLoader {
    /// Loader running Lua plugins
    pub fn new() -> Self {
        Self::with_loader(Arc::new(LuaModuleLoader::new()))
    }

    pub fn with_loader(loader: Arc<dyn ModuleLoader>) -> Self {
        Self { loader }
    }

    /// Load every configured plugin folder.
    ///
    /// Returns an empty report without touching the filesystem unless
    /// `experimental.localPlugins.enabled` is explicitly `true`.
    pub async fn load(&self, config: &LoamConfig) -> LoadReport {
        let Some(plugins) = config.local_plugins().filter(|p| p.is_enabled()) else {
            debug!("Local plugins disabled");
            return LoadReport::default();
        };

        let timeout = plugins.load_timeout();
        info!(
            folders = plugins.plugin_folders.len(),
            "Loading local plugins"
        );

        let results = join_all(
            plugins
                .plugin_folders
                .iter()
                .map(|folder| self.load_folder(folder, timeout)),
        )
        .await;

        let mut report = LoadReport::default();
        for result in results {
            match result {
                Ok(record) => {
                    info!(
                        name = %record.name,
                        source = %record.source.display(),
                        capabilities = %record.capabilities(),
                        "Loaded plugin"
                    );
                    report.extensions.push(record);
                }
                Err(e) if e.is_disabled() => {
                    info!(path = %e.path().display(), "Skipping disabled plugin");
                    report.skipped.push(e);
                }
                Err(e) => {
                    warn!(path = %e.path().display(), "Skipping plugin: {}", e);
                    report.skipped.push(e);
                }
            }
        }

        report
    }

    async fn load_folder(&self, folder: &Path, timeout: Duration) -> ExtensionResult<ExtensionRecord> {
        match tokio::time::timeout(timeout, self.loader.load_module(folder)).await {
            Ok(result) => result,
            Err(_) => Err(ExtensionError::Timeout {
                path: folder.to_path_buf(),
                timeout,
            }),
        }
    }
}

/// Load the configured Lua plugins, dropping failures after logging them
pub async fn load_extensions(config: &LoamConfig) -> Vec<ExtensionRecord> {
    ExtensionLoader::new().load(config).await.extensions
}
