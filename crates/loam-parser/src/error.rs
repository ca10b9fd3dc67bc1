//! Parser error types

use crate::extension::HookStage;
use loam_core::NoteUri;
use thiserror::Error;

/// Parser error type
#[derive(Debug, Error)]
pub enum ParserError {
    /// A parser extension hook failed; parsing of this note was aborted
    #[error("Parser extension '{extension}' failed in {stage} for {uri}: {source}")]
    Hook {
        extension: String,
        uri: NoteUri,
        stage: HookStage,
        #[source]
        source: anyhow::Error,
    },
}

/// Specialized Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

impl ParserError {
    pub fn hook(
        extension: impl Into<String>,
        uri: &NoteUri,
        stage: HookStage,
        source: anyhow::Error,
    ) -> Self {
        Self::Hook {
            extension: extension.into(),
            uri: uri.clone(),
            stage,
            source,
        }
    }

    /// Name of the extension that caused the failure
    pub fn extension(&self) -> &str {
        match self {
            Self::Hook { extension, .. } => extension,
        }
    }

    /// Identifier of the note being parsed
    pub fn uri(&self) -> &NoteUri {
        match self {
            Self::Hook { uri, .. } => uri,
        }
    }
}
