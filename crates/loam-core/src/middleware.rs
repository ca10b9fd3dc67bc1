//! Graph middleware contract
//!
//! Middleware sees every note on its way into a [`NoteGraph`](crate::NoteGraph).
//! The graph folds its middleware list left to right: the first registered
//! middleware receives the caller's note, each later one receives the
//! previous output, and the last output is what gets stored.

use crate::error::MiddlewareError;
use crate::note::Note;
use std::fmt;
use std::sync::Arc;

pub trait GraphMiddleware: Send + Sync {
    /// Name used in error reports and logs
    fn name(&self) -> &str;

    /// Transform (or reject) a note before it is stored
    fn apply(&self, note: Note) -> Result<Note, MiddlewareError>;
}

impl fmt::Debug for dyn GraphMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphMiddleware")
            .field("name", &self.name())
            .finish()
    }
}

/// Middleware backed by a closure
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> GraphMiddleware for FnMiddleware<F>
where
    F: Fn(Note) -> Result<Note, MiddlewareError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, note: Note) -> Result<Note, MiddlewareError> {
        (self.f)(note)
    }
}

/// Wrap a closure as shareable middleware
pub fn middleware_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn GraphMiddleware>
where
    F: Fn(Note) -> Result<Note, MiddlewareError> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware {
        name: name.into(),
        f,
    })
}
