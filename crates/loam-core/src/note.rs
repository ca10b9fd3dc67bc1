//! Note data model
//!
//! A [`Note`] is the parsed form of one markdown source. Links reference
//! target identifiers rather than notes, so a note may point at something
//! that has not been parsed yet (or never will be).

use crate::properties::{PropertyMap, PropertyValue};
use crate::uri::NoteUri;
use serde::{Deserialize, Serialize};

/// Zero-based line/character position in a note's source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open source range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// `[[target]]` or `![[target]]`
    Wikilink,
    /// `[label](target.md)`
    Markdown,
}

/// Outgoing link declared by a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteLink {
    pub kind: LinkKind,
    pub target: NoteUri,
    #[serde(default)]
    pub label: Option<String>,
    /// Link text exactly as written in the source
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub range: Range,
}

impl NoteLink {
    pub fn new(kind: LinkKind, target: NoteUri) -> Self {
        Self {
            kind,
            target,
            label: None,
            raw: String::new(),
            range: Range::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 through 6
    pub level: u8,
    pub text: String,
    #[serde(default)]
    pub range: Range,
}

/// Raw text and layout metadata of the source a note was parsed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSource {
    pub text: String,
    /// First position after the frontmatter block
    #[serde(default)]
    pub content_start: Position,
    #[serde(default)]
    pub end: Position,
    #[serde(default = "default_eol")]
    pub eol: String,
}

fn default_eol() -> String {
    "\n".to_string()
}

impl Default for NoteSource {
    fn default() -> Self {
        Self {
            text: String::new(),
            content_start: Position::default(),
            end: Position::default(),
            eol: default_eol(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub uri: NoteUri,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub properties: PropertyMap,
    /// Sorted, without duplicates
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub links: Vec<NoteLink>,
    #[serde(default)]
    pub source: NoteSource,
}

impl Note {
    /// Empty note at `uri`
    pub fn new(uri: NoteUri) -> Self {
        Self {
            uri,
            title: None,
            properties: PropertyMap::new(),
            tags: Vec::new(),
            headings: Vec::new(),
            links: Vec::new(),
            source: NoteSource::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn with_link(mut self, link: NoteLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Returns the previous value, if any
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Distinct link targets, in first-seen order
    pub fn link_targets(&self) -> Vec<&NoteUri> {
        let mut targets: Vec<&NoteUri> = Vec::with_capacity(self.links.len());
        for link in &self.links {
            if !targets.contains(&&link.target) {
                targets.push(&link.target);
            }
        }
        targets
    }
}
