//! Parser extension contract
//!
//! Extensions hook into parsing at two points:
//!
//! ```text
//! raw text ─▶ before_parse (ext 1 … ext n) ─▶ grammar ─▶ after_parse (ext 1 … ext n) ─▶ Note
//! ```
//!
//! Both hook kinds run in extension-list order, each receiving the previous
//! hook's output. Default implementations pass their input through.

use loam_core::{Note, NoteUri};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    BeforeParse,
    AfterParse,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeParse => f.write_str("before_parse"),
            Self::AfterParse => f.write_str("after_parse"),
        }
    }
}

pub trait ParserExtension: Send + Sync {
    /// Name used in error reports and logs
    fn name(&self) -> &str;

    /// Observe or rewrite the raw text before the grammar runs
    fn before_parse(&self, _uri: &NoteUri, text: String) -> anyhow::Result<String> {
        Ok(text)
    }

    /// Observe or rewrite the note the grammar produced
    fn after_parse(&self, note: Note) -> anyhow::Result<Note> {
        Ok(note)
    }
}

impl fmt::Debug for dyn ParserExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserExtension")
            .field("name", &self.name())
            .finish()
    }
}
