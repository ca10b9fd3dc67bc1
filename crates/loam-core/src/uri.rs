//! Canonical note identifiers
//!
//! A [`NoteUri`] is a scheme plus an absolute, `/`-separated path. Paths are
//! normalised lexically at construction (`.` and `..` segments resolved,
//! repeated separators collapsed), so two spellings of the same location
//! compare equal and hash identically.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Scheme used for notes that live on the local filesystem
pub const FILE_SCHEME: &str = "file";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("URI is empty")]
    Empty,

    #[error("Invalid URI scheme: {0}")]
    InvalidScheme(String),
}

/// Identifier of a note in the graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteUri {
    scheme: String,
    path: String,
}

impl NoteUri {
    /// Build an identifier from a scheme and a path.
    ///
    /// Relative paths are anchored at the root.
    pub fn new(scheme: impl Into<String>, path: &str) -> Self {
        Self {
            scheme: scheme.into(),
            path: normalize_path(path),
        }
    }

    /// Identifier for a filesystem path
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::new(FILE_SCHEME, &path.as_ref().to_string_lossy())
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory portion of the path, always ending in `/`
    pub fn dir(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..=idx],
            None => "/",
        }
    }

    /// Last path segment, if any
    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Extension of the last path segment, without the dot
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        let idx = name.rfind('.')?;
        (idx > 0).then(|| &name[idx + 1..])
    }

    /// File name without its extension
    pub fn stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[..idx]),
            _ => Some(name),
        }
    }

    /// Resolve `reference` against this identifier's directory.
    ///
    /// Absolute references (`/a/b.md`) keep the scheme and replace the path.
    pub fn join(&self, reference: &str) -> Self {
        let reference = reference.replace('\\', "/");
        if reference.starts_with('/') {
            return Self::new(self.scheme.clone(), &reference);
        }
        Self::new(self.scheme.clone(), &format!("{}{}", self.dir(), reference))
    }

    /// Same identifier with `ext` appended when the last segment has no extension
    pub fn with_default_extension(self, ext: &str) -> Self {
        if self.extension().is_some() || ext.is_empty() {
            return self;
        }
        let ext = ext.trim_start_matches('.');
        let path = format!("{}.{}", self.path, ext);
        Self::new(self.scheme, &path)
    }

    /// Path as a filesystem path. Only meaningful for `file` identifiers.
    pub fn to_path_buf(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.path)
    }
}

impl fmt::Display for NoteUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

impl FromStr for NoteUri {
    type Err = UriError;

    /// Parses `scheme://path`. A bare path is treated as a `file` identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(UriError::Empty);
        }

        match s.split_once("://") {
            Some((scheme, path)) => {
                let valid = scheme
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic())
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
                if !valid {
                    return Err(UriError::InvalidScheme(scheme.to_string()));
                }
                Ok(Self::new(scheme.to_ascii_lowercase(), path))
            }
            None => Ok(Self::file(s)),
        }
    }
}

impl Serialize for NoteUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NoteUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in &segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }

    // Windows filesystems are case-insensitive
    if cfg!(windows) {
        normalized = normalized.to_lowercase();
    }

    normalized
}
