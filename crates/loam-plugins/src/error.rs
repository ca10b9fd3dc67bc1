//! Extension loading errors

use crate::manifest::ManifestError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a single plugin folder produced no extension
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Plugin not found at {path}")]
    NotFound { path: PathBuf },

    #[error("Plugin at {path} is disabled by its manifest")]
    Disabled { path: PathBuf },

    #[error("Invalid manifest in {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error("Failed to load plugin {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Plugin {path} does not export a valid extension: {reason}")]
    ShapeInvalid { path: PathBuf, reason: String },

    #[error("Plugin {path} did not load within {timeout:?}")]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtensionError {
    pub fn load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn shape(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ShapeInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Folder or file the error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound { path }
            | Self::Disabled { path }
            | Self::Manifest { path, .. }
            | Self::Load { path, .. }
            | Self::ShapeInvalid { path, .. }
            | Self::Timeout { path, .. }
            | Self::Io { path, .. } => path,
        }
    }

    /// Disabled plugins are skipped deliberately, not failures
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled { .. })
    }
}

pub type ExtensionResult<T> = Result<T, ExtensionError>;
