//! Parser pipeline: extension hooks around the base grammar

use crate::error::{ParserError, ParserResult};
use crate::extension::{HookStage, ParserExtension};
use crate::markdown::MarkdownGrammar;
use loam_config::ParserConfig;
use loam_core::{Note, NoteUri};
use std::sync::Arc;
use tracing::debug;

/// Markdown parser wired with an ordered list of extensions.
///
/// Holds no per-parse state, so a failed parse leaves it fully reusable and
/// parsing the same text twice yields equal notes.
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    extensions: Vec<Arc<dyn ParserExtension>>,
    grammar: MarkdownGrammar,
}

/// Create a parser wired with `extensions`, applied in list order
pub fn create_parser(
    extensions: Vec<Arc<dyn ParserExtension>>,
    config: &ParserConfig,
) -> MarkdownParser {
    MarkdownParser::new(extensions, config)
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new(Vec::new(), &ParserConfig::default())
    }
}

impl MarkdownParser {
    pub fn new(extensions: Vec<Arc<dyn ParserExtension>>, config: &ParserConfig) -> Self {
        Self {
            extensions,
            grammar: MarkdownGrammar::new(config),
        }
    }

    pub fn extensions(&self) -> &[Arc<dyn ParserExtension>] {
        &self.extensions
    }

    pub fn parse(&self, uri: &NoteUri, text: &str) -> ParserResult<Note> {
        let mut text = text.to_string();
        for extension in &self.extensions {
            text = extension
                .before_parse(uri, text)
                .map_err(|e| ParserError::hook(extension.name(), uri, HookStage::BeforeParse, e))?;
        }

        let mut note = self.grammar.parse(uri, &text);

        for extension in &self.extensions {
            note = extension
                .after_parse(note)
                .map_err(|e| ParserError::hook(extension.name(), uri, HookStage::AfterParse, e))?;
        }

        debug!(
            uri = %uri,
            links = note.links.len(),
            extensions = self.extensions.len(),
            "Parsed note"
        );
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::PropertyValue;

    struct HeadingDetector;

    impl ParserExtension for HeadingDetector {
        fn name(&self) -> &str {
            "heading-detector"
        }

        fn after_parse(&self, mut note: Note) -> anyhow::Result<Note> {
            let has_heading = note.headings.iter().any(|h| h.level == 1);
            note.set_property("hasHeading", has_heading);
            Ok(note)
        }
    }

    struct Append(&'static str);

    impl ParserExtension for Append {
        fn name(&self) -> &str {
            self.0
        }

        fn before_parse(&self, _uri: &NoteUri, text: String) -> anyhow::Result<String> {
            Ok(format!("{text}\n[[{}]]", self.0))
        }
    }

    struct Failing;

    impl ParserExtension for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn after_parse(&self, _note: Note) -> anyhow::Result<Note> {
            anyhow::bail!("cannot handle this note")
        }
    }

    #[test]
    fn test_parser_extension_adds_property() {
        let parser = create_parser(vec![Arc::new(HeadingDetector)], &ParserConfig::default());
        let note = parser
            .parse(
                &NoteUri::file("/path/to/a"),
                "\n# This is a note with header\nand some content",
            )
            .unwrap();

        assert!(note
            .property("hasHeading")
            .is_some_and(PropertyValue::is_truthy));
    }

    #[test]
    fn test_extension_overrides_base_property() {
        let parser = MarkdownParser::default();
        let note = parser
            .parse(&NoteUri::file("/a.md"), "## Subheading\n")
            .unwrap();
        assert_eq!(note.property("hasHeading"), Some(&PropertyValue::Bool(true)));

        let parser = create_parser(vec![Arc::new(HeadingDetector)], &ParserConfig::default());
        let note = parser
            .parse(&NoteUri::file("/a.md"), "## Subheading\n")
            .unwrap();
        assert_eq!(note.property("hasHeading"), Some(&PropertyValue::Bool(false)));
    }

    #[test]
    fn test_before_parse_hooks_run_in_order() {
        let parser = MarkdownParser::new(
            vec![Arc::new(Append("first")), Arc::new(Append("second"))],
            &ParserConfig::default(),
        );
        let note = parser.parse(&NoteUri::file("/a.md"), "body").unwrap();

        let targets: Vec<_> = note.links.iter().map(|l| l.target.path()).collect();
        assert_eq!(targets, vec!["/first.md", "/second.md"]);
        assert_eq!(note.source.text, "body\n[[first]]\n[[second]]");
    }

    #[test]
    fn test_hook_failure_names_extension_and_note() {
        let parser = MarkdownParser::new(
            vec![Arc::new(HeadingDetector), Arc::new(Failing)],
            &ParserConfig::default(),
        );
        let uri = NoteUri::file("/notes/broken.md");

        let err = parser.parse(&uri, "# Title").unwrap_err();
        assert_eq!(err.extension(), "failing");
        assert_eq!(err.uri(), &uri);
        assert!(matches!(
            err,
            ParserError::Hook {
                stage: HookStage::AfterParse,
                ..
            }
        ));
    }

    #[test]
    fn test_parser_reusable_after_failure() {
        let failing = MarkdownParser::new(vec![Arc::new(Failing)], &ParserConfig::default());
        assert!(failing.parse(&NoteUri::file("/a.md"), "x").is_err());
        assert!(failing.parse(&NoteUri::file("/a.md"), "x").is_err());

        let parser = MarkdownParser::new(vec![Arc::new(HeadingDetector)], &ParserConfig::default());
        let first = parser.parse(&NoteUri::file("/a.md"), "# A\n[[b]]").unwrap();
        let second = parser.parse(&NoteUri::file("/a.md"), "# A\n[[b]]").unwrap();
        assert_eq!(first, second);
    }
}
