//! Graph error types

use crate::uri::NoteUri;
use thiserror::Error;

/// Failure reported by a single middleware
#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// The middleware refused to let the note into the graph
    #[error("Note rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl MiddlewareError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Graph mutation error. A failed mutation leaves the graph untouched.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Middleware '{middleware}' failed for {uri}: {source}")]
    Middleware {
        middleware: String,
        uri: NoteUri,
        #[source]
        source: MiddlewareError,
    },

    #[error("Middleware '{middleware}' changed note identifier from {expected} to {actual}")]
    IdentifierChanged {
        middleware: String,
        expected: NoteUri,
        actual: NoteUri,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    /// Name of the middleware that aborted the mutation
    pub fn middleware(&self) -> &str {
        match self {
            Self::Middleware { middleware, .. } | Self::IdentifierChanged { middleware, .. } => {
                middleware
            }
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Middleware {
                source: MiddlewareError::Rejected(_),
                ..
            }
        )
    }
}
