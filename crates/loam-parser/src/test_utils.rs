//! Helpers for parser tests

use crate::error::ParserResult;
use crate::extension::ParserExtension;
use crate::pipeline::MarkdownParser;
use loam_config::ParserConfig;
use loam_core::{Note, NoteUri};
use std::sync::Arc;

/// Parse `content` as the note at `path` with no extensions
pub fn parse_note(content: &str, path: &str) -> ParserResult<Note> {
    MarkdownParser::default().parse(&NoteUri::file(path), content)
}

/// Parse `content` as the note at `path` through `extensions`
pub fn parse_note_with(
    extensions: Vec<Arc<dyn ParserExtension>>,
    content: &str,
    path: &str,
) -> ParserResult<Note> {
    MarkdownParser::new(extensions, &ParserConfig::default()).parse(&NoteUri::file(path), content)
}
