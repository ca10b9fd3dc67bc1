//! Loam Markdown Parser
//!
//! Turns note text into a [`loam_core::Note`]:
//! - Base grammar: frontmatter, headings, wikilinks, markdown links, tags
//! - Extension hooks before and after the grammar, applied in list order
//! - Stateless parser, safe to reuse after a failed parse

pub mod error;
pub mod extension;
pub mod frontmatter;
pub mod markdown;
pub mod pipeline;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ParserError, ParserResult};
pub use extension::{HookStage, ParserExtension};
pub use markdown::MarkdownGrammar;
pub use pipeline::{create_parser, MarkdownParser};
