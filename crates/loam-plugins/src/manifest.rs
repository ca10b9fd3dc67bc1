//! Plugin manifest parsing and validation
//!
//! A plugin folder may carry a `plugin.yaml` describing its entry script.
//! Folders without one load `init.lua`.
//!
//! ## Example Manifest
//!
//! ```yaml
//! description: Flags notes that open with a heading
//! version: "1.0.0"
//! main: lua/init.lua
//! enabled: true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// File names checked, in order, when looking for a manifest
pub const MANIFEST_CANDIDATES: [&str; 4] =
    ["plugin.yaml", "plugin.yml", "manifest.yaml", "manifest.yml"];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid version format: {0}")]
    InvalidVersion(String),
}

pub type ManifestResult<T> = Result<T, ManifestError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginManifest {
    /// Used when the script exports no `name`; the exported name wins
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Entry script, relative to the plugin folder
    #[serde(default = "default_main")]
    pub main: String,

    #[serde(default)]
    pub enabled: Option<bool>,
}

fn default_main() -> String {
    "init.lua".to_string()
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            name: None,
            version: None,
            description: String::new(),
            main: default_main(),
            enabled: None,
        }
    }
}

impl PluginManifest {
    pub fn from_yaml(yaml: &str) -> ManifestResult<Self> {
        let manifest: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_file(path: &Path) -> ManifestResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first manifest found in `plugin_dir`, if any
    pub fn discover(plugin_dir: &Path) -> ManifestResult<Option<Self>> {
        for name in MANIFEST_CANDIDATES {
            let path = plugin_dir.join(name);
            if path.exists() {
                return Self::from_file(&path).map(Some);
            }
        }

        Ok(None)
    }

    /// Manifest found in `plugin_dir`, or the defaults
    pub fn discover_or_default(plugin_dir: &Path) -> ManifestResult<Self> {
        Ok(Self::discover(plugin_dir)?.unwrap_or_default())
    }

    pub fn validate(&self) -> ManifestResult<()> {
        if self.main.trim().is_empty() {
            return Err(ManifestError::Validation("main must not be empty".into()));
        }

        let main = Path::new(&self.main);
        let escapes = main
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ManifestError::Validation(format!(
                "main '{}' must be a path inside the plugin folder",
                self.main
            )));
        }

        if let Some(version) = &self.version {
            if !is_valid_version(version) {
                return Err(ManifestError::InvalidVersion(version.clone()));
            }
        }

        Ok(())
    }

    pub fn main_path(&self, plugin_dir: &Path) -> PathBuf {
        plugin_dir.join(&self.main)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// `major.minor.patch` with an optional `-prerelease` suffix
fn is_valid_version(version: &str) -> bool {
    let core = version.split_once('-').map_or(version, |(core, _)| core);
    let parts: Vec<&str> = core.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = PluginManifest::from_yaml("description: hi\n").unwrap();
        assert_eq!(manifest.main, "init.lua");
        assert!(manifest.is_enabled());
        assert!(manifest.name.is_none());
    }

    #[test]
    fn test_empty_manifest_is_default() {
        assert_eq!(
            PluginManifest::from_yaml("").unwrap(),
            PluginManifest::default()
        );
    }

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
name: heading-flags
version: "1.2.0-beta"
description: Flags headings
main: lua/entry.lua
enabled: false
"#;
        let manifest = PluginManifest::from_yaml(yaml).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("heading-flags"));
        assert_eq!(manifest.main_path(Path::new("/p")), PathBuf::from("/p/lua/entry.lua"));
        assert!(!manifest.is_enabled());
    }

    #[test]
    fn test_validate_main_escaping_folder() {
        for main in ["../outside.lua", "/etc/init.lua", ""] {
            let yaml = format!("main: \"{}\"\n", main);
            assert!(
                matches!(
                    PluginManifest::from_yaml(&yaml),
                    Err(ManifestError::Validation(_))
                ),
                "main {:?} should be rejected",
                main
            );
        }
    }

    #[test]
    fn test_validate_invalid_version() {
        let result = PluginManifest::from_yaml("version: \"1.0\"\n");
        assert!(matches!(result, Err(ManifestError::InvalidVersion(_))));
    }

    #[test]
    fn test_valid_versions() {
        assert!(is_valid_version("1.0.0"));
        assert!(is_valid_version("10.20.30"));
        assert!(is_valid_version("1.0.0-alpha"));
        assert!(!is_valid_version("1.0"));
        assert!(!is_valid_version("v1.0.0"));
        assert!(!is_valid_version("1.x.0"));
    }

    #[test]
    fn test_discover() {
        let dir = TempDir::new().unwrap();
        assert!(PluginManifest::discover(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join("plugin.yml"), "main: entry.lua\n").unwrap();
        let manifest = PluginManifest::discover(dir.path()).unwrap().unwrap();
        assert_eq!(manifest.main, "entry.lua");
    }

    #[test]
    fn test_discover_malformed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("plugin.yaml"), "main: [nope\n").unwrap();
        assert!(matches!(
            PluginManifest::discover(dir.path()),
            Err(ManifestError::Yaml(_))
        ));
    }
}
