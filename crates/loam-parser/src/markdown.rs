//! Base markdown grammar
//!
//! Turns note text into a [`Note`] with:
//! - frontmatter properties and title
//! - headings (all levels)
//! - wikilinks `[[target]]`, `[[target|label]]`, `[[target#section]]`, `![[embed]]`
//! - relative markdown links `[label](path.md)`
//! - tags from frontmatter and inline `#tags`
//! - a `hasHeading` property when the note has no explicit one
//!
//! Structure comes from pulldown-cmark. Wikilinks and inline tags are matched
//! with regexes over the body, skipping code spans and code blocks.

use crate::frontmatter::{parse_properties, property_tags, split_frontmatter};
use loam_config::ParserConfig;
use loam_core::{
    Heading, LinkKind, Note, NoteLink, NoteSource, NoteUri, Position, PropertyValue, Range,
};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::ops::Range as ByteRange;
use std::sync::LazyLock;

static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\[\]]+)\]\]").expect("wikilink regex"));

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(])#([\p{L}_][\p{L}\p{N}_/-]*)").expect("tag regex")
});

/// Derived property recording whether the note has any heading
pub const HAS_HEADING_PROPERTY: &str = "hasHeading";

static URL_SCHEME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").expect("url scheme regex"));

/// The fixed markdown grammar every parse starts from
#[derive(Debug, Clone)]
pub struct MarkdownGrammar {
    default_extension: String,
}

impl Default for MarkdownGrammar {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl MarkdownGrammar {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            default_extension: config.default_note_extension.clone(),
        }
    }

    pub fn parse(&self, uri: &NoteUri, text: &str) -> Note {
        let lines = LineIndex::new(text);

        let (mut properties, body_offset) = match split_frontmatter(text) {
            Some(fm) => (parse_properties(fm.yaml), fm.body_offset),
            None => (Default::default(), 0),
        };
        let body = &text[body_offset..];

        let structure = scan_structure(body);

        let mut links: Vec<(usize, NoteLink)> = Vec::new();
        for (range, dest, label) in &structure.markdown_links {
            let Some(target) = self.resolve_markdown_target(uri, dest) else {
                continue;
            };
            let start = body_offset + range.start;
            let end = body_offset + range.end;
            links.push((
                start,
                NoteLink {
                    kind: LinkKind::Markdown,
                    target,
                    label: Some(label.clone()).filter(|l| !l.is_empty()),
                    raw: text[start..end].to_string(),
                    range: lines.range(text, start..end),
                },
            ));
        }

        for cap in WIKILINK_REGEX.captures_iter(body) {
            let Some(full) = cap.get(0) else { continue };
            if structure.in_code(full.start()) {
                continue;
            }
            let inner = cap.get(2).map_or("", |m| m.as_str());
            let Some((target, label)) = self.resolve_wikilink(uri, inner) else {
                continue;
            };
            let start = body_offset + full.start();
            let end = body_offset + full.end();
            links.push((
                start,
                NoteLink {
                    kind: LinkKind::Wikilink,
                    target,
                    label,
                    raw: full.as_str().to_string(),
                    range: lines.range(text, start..end),
                },
            ));
        }
        links.sort_by_key(|(start, _)| *start);

        let mut tags: BTreeSet<String> = property_tags(&properties).into_iter().collect();
        for cap in TAG_REGEX.captures_iter(body) {
            if let Some(tag) = cap.get(1) {
                if !structure.in_code(tag.start()) && !structure.in_destination(tag.start()) {
                    tags.insert(tag.as_str().to_string());
                }
            }
        }

        let headings: Vec<Heading> = structure
            .headings
            .into_iter()
            .map(|(level, heading_text, range)| Heading {
                level,
                text: heading_text,
                range: lines.range(text, body_offset + range.start..body_offset + range.end),
            })
            .collect();

        properties
            .entry(HAS_HEADING_PROPERTY.to_string())
            .or_insert(PropertyValue::Bool(!headings.is_empty()));

        let title = properties
            .get("title")
            .and_then(PropertyValue::as_str)
            .map(str::to_string)
            .or_else(|| {
                headings
                    .iter()
                    .find(|h| h.level == 1)
                    .map(|h| h.text.clone())
            });

        Note {
            uri: uri.clone(),
            title,
            properties,
            tags: tags.into_iter().collect(),
            headings,
            links: links.into_iter().map(|(_, link)| link).collect(),
            source: NoteSource {
                text: text.to_string(),
                content_start: lines.position(text, body_offset),
                end: lines.position(text, text.len()),
                eol: detect_eol(text).to_string(),
            },
        }
    }

    /// `target#section|label` → (identifier, label). Section-only links have no target.
    fn resolve_wikilink(&self, uri: &NoteUri, inner: &str) -> Option<(NoteUri, Option<String>)> {
        let (target_part, label) = match inner.split_once('|') {
            Some((target, label)) => (target, Some(label.trim().to_string())),
            None => (inner, None),
        };
        let target = target_part.split('#').next().unwrap_or("").trim();
        if target.is_empty() {
            return None;
        }

        let resolved = uri.join(target).with_default_extension(&self.default_extension);
        Some((resolved, label.filter(|l| !l.is_empty())))
    }

    /// Relative links become identifiers; external URLs and fragments do not
    fn resolve_markdown_target(&self, uri: &NoteUri, dest: &str) -> Option<NoteUri> {
        let dest = dest.trim();
        if dest.is_empty() || dest.starts_with('#') || URL_SCHEME_REGEX.is_match(dest) {
            return None;
        }

        let path = dest.split(['#', '?']).next().unwrap_or("");
        if path.is_empty() {
            return None;
        }
        let path = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        Some(uri.join(&path).with_default_extension(&self.default_extension))
    }
}

#[derive(Debug, Default)]
struct Structure {
    headings: Vec<(u8, String, ByteRange<usize>)>,
    /// (range, destination, label)
    markdown_links: Vec<(ByteRange<usize>, String, String)>,
    /// `(destination)` part of inline links
    destinations: Vec<ByteRange<usize>>,
    code: Vec<ByteRange<usize>>,
}

impl Structure {
    fn in_code(&self, offset: usize) -> bool {
        self.code.iter().any(|r| r.contains(&offset))
    }

    fn in_destination(&self, offset: usize) -> bool {
        self.destinations.iter().any(|r| r.contains(&offset))
    }
}

fn scan_structure(body: &str) -> Structure {
    let mut structure = Structure::default();

    let mut heading: Option<(u8, String, ByteRange<usize>)> = None;
    let mut link: Option<(String, String, ByteRange<usize>)> = None;

    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    for (event, range) in CmarkParser::new_ext(body, options).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((heading_level(level), String::new(), range));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text, range)) = heading.take() {
                    let trimmed_end = range.start + body[range.clone()].trim_end().len();
                    structure
                        .headings
                        .push((level, text.trim().to_string(), range.start..trimmed_end));
                }
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                link = Some((dest_url.to_string(), String::new(), range));
            }
            Event::End(TagEnd::Link) => {
                if let Some((dest, label, range)) = link.take() {
                    if let Some(idx) = body[range.clone()].rfind("](") {
                        structure.destinations.push(range.start + idx + 1..range.end);
                    }
                    structure.markdown_links.push((range, dest, label));
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                structure.code.push(range);
            }
            Event::Code(code) => {
                structure.code.push(range);
                push_text(&mut heading, &mut link, &code);
            }
            Event::Text(text) => push_text(&mut heading, &mut link, &text),
            Event::SoftBreak | Event::HardBreak => push_text(&mut heading, &mut link, " "),
            _ => {}
        }
    }

    structure
}

fn push_text(
    heading: &mut Option<(u8, String, ByteRange<usize>)>,
    link: &mut Option<(String, String, ByteRange<usize>)>,
    text: &str,
) {
    if let Some((_, buf, _)) = heading.as_mut() {
        buf.push_str(text);
    }
    if let Some((_, buf, _)) = link.as_mut() {
        buf.push_str(text);
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn detect_eol(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Byte offset → line/character conversion
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn position(&self, text: &str, offset: usize) -> Position {
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let character = text[self.starts[line]..offset].chars().count();
        Position::new(line as u32, character as u32)
    }

    fn range(&self, text: &str, range: ByteRange<usize>) -> Range {
        Range::new(self.position(text, range.start), self.position(text, range.end))
    }
}
