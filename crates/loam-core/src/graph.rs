//! In-memory note graph
//!
//! Stores notes by identifier alongside a forward and a backward link index.
//! The backward index is keyed by link target, so it also covers targets that
//! have no stored note (placeholders).
//!
//! ## Invariant
//!
//! For every stored note `N` and every link `L` in `N.links`,
//! `links(&L.target, Direction::Backward)` contains an entry whose source is
//! `N.uri`. Removing `N` drops its forward links; links *into* `N` from other
//! notes stay, turning `N` into a placeholder target.

use crate::error::{GraphError, GraphResult};
use crate::middleware::GraphMiddleware;
use crate::note::{Note, NoteLink};
use crate::uri::NoteUri;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Links declared by the note
    Forward,
    /// Links pointing at the note
    Backward,
}

/// A link as recorded in the adjacency index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphLink {
    pub source: NoteUri,
    pub target: NoteUri,
    pub link: NoteLink,
}

#[derive(Debug, Default)]
pub struct NoteGraph {
    notes: HashMap<NoteUri, Note>,
    forward: HashMap<NoteUri, Vec<GraphLink>>,
    backward: HashMap<NoteUri, Vec<GraphLink>>,
    middleware: Vec<Arc<dyn GraphMiddleware>>,
}

/// Create a graph wired with `middleware`, applied in list order
pub fn create_graph(middleware: Vec<Arc<dyn GraphMiddleware>>) -> NoteGraph {
    NoteGraph::with_middleware(middleware)
}

impl NoteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_middleware(middleware: Vec<Arc<dyn GraphMiddleware>>) -> Self {
        Self {
            middleware,
            ..Self::default()
        }
    }

    /// Run the middleware chain over `note` and store the result.
    ///
    /// Any note already stored at the same identifier is replaced and its
    /// links are re-indexed. If a middleware fails nothing is written.
    pub fn set_note(&mut self, note: Note) -> GraphResult<&Note> {
        let note = self.apply_middleware(note)?;
        let uri = note.uri.clone();

        self.unlink(&uri);
        self.link(&note);

        debug!(uri = %uri, links = note.links.len(), "Stored note");

        let stored = match self.notes.entry(uri) {
            Entry::Occupied(mut entry) => {
                entry.insert(note);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(note),
        };
        Ok(stored)
    }

    pub fn get_note(&self, uri: &NoteUri) -> Option<&Note> {
        self.notes.get(uri)
    }

    /// Remove the note at `uri`, returning it if it was stored.
    ///
    /// Backward links pointing at `uri` from other notes are kept.
    pub fn remove_note(&mut self, uri: &NoteUri) -> Option<Note> {
        let removed = self.notes.remove(uri)?;
        self.unlink(uri);
        debug!(uri = %uri, "Removed note");
        Some(removed)
    }

    /// Links from (`Forward`) or to (`Backward`) `uri`, placeholders included
    pub fn links(&self, uri: &NoteUri, direction: Direction) -> &[GraphLink] {
        let index = match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        };
        index.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct identifiers of notes linking to `uri`
    pub fn backlink_sources(&self, uri: &NoteUri) -> Vec<&NoteUri> {
        let mut seen = HashSet::new();
        self.links(uri, Direction::Backward)
            .iter()
            .map(|l| &l.source)
            .filter(|source| seen.insert(*source))
            .collect()
    }

    pub fn contains(&self, uri: &NoteUri) -> bool {
        self.notes.contains_key(uri)
    }

    /// Whether `uri` is linked to but not stored
    pub fn is_placeholder(&self, uri: &NoteUri) -> bool {
        !self.notes.contains_key(uri) && self.backward.contains_key(uri)
    }

    /// All placeholder targets, sorted
    pub fn placeholders(&self) -> Vec<&NoteUri> {
        let mut targets: Vec<&NoteUri> = self
            .backward
            .keys()
            .filter(|uri| !self.notes.contains_key(*uri))
            .collect();
        targets.sort();
        targets
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn middleware(&self) -> &[Arc<dyn GraphMiddleware>] {
        &self.middleware
    }

    fn apply_middleware(&self, note: Note) -> GraphResult<Note> {
        self.middleware.iter().try_fold(note, |note, middleware| {
            let expected = note.uri.clone();
            let next = middleware
                .apply(note)
                .map_err(|source| GraphError::Middleware {
                    middleware: middleware.name().to_string(),
                    uri: expected.clone(),
                    source,
                })?;

            if next.uri != expected {
                return Err(GraphError::IdentifierChanged {
                    middleware: middleware.name().to_string(),
                    expected,
                    actual: next.uri,
                });
            }
            Ok(next)
        })
    }

    fn link(&mut self, note: &Note) {
        if note.links.is_empty() {
            return;
        }

        let mut outgoing = Vec::with_capacity(note.links.len());
        for link in &note.links {
            let edge = GraphLink {
                source: note.uri.clone(),
                target: link.target.clone(),
                link: link.clone(),
            };
            self.backward
                .entry(link.target.clone())
                .or_default()
                .push(edge.clone());
            outgoing.push(edge);
        }
        self.forward.insert(note.uri.clone(), outgoing);
    }

    fn unlink(&mut self, uri: &NoteUri) {
        let Some(outgoing) = self.forward.remove(uri) else {
            return;
        };

        let targets: HashSet<&NoteUri> = outgoing.iter().map(|l| &l.target).collect();
        for target in targets {
            if let Entry::Occupied(mut entry) = self.backward.entry(target.clone()) {
                entry.get_mut().retain(|l| &l.source != uri);
                if entry.get().is_empty() {
                    entry.remove();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MiddlewareError;
    use crate::middleware::middleware_fn;
    use crate::note::LinkKind;
    use crate::properties::PropertyValue;

    fn uri(path: &str) -> NoteUri {
        NoteUri::file(path)
    }

    fn note(path: &str, targets: &[&str]) -> Note {
        targets.iter().fold(Note::new(uri(path)), |note, target| {
            note.with_link(NoteLink::new(LinkKind::Wikilink, uri(target)))
        })
    }

    fn sources(graph: &NoteGraph, path: &str) -> Vec<String> {
        let mut sources: Vec<String> = graph
            .links(&uri(path), Direction::Backward)
            .iter()
            .map(|l| l.source.path().to_string())
            .collect();
        sources.sort();
        sources
    }

    #[test]
    fn test_set_and_get_note() {
        let mut graph = NoteGraph::new();
        let stored = graph.set_note(note("/a.md", &["/b.md"])).unwrap();
        assert_eq!(stored.uri, uri("/a.md"));

        assert!(graph.contains(&uri("/a.md")));
        assert_eq!(graph.get_note(&uri("/a.md")).unwrap().links.len(), 1);
        assert!(graph.get_note(&uri("/b.md")).is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_placeholder_backlinks_survive_target_creation() {
        let mut graph = NoteGraph::new();
        graph.set_note(note("/a.md", &["/b.md"])).unwrap();

        assert_eq!(sources(&graph, "/b.md"), vec!["/a.md"]);
        assert!(graph.is_placeholder(&uri("/b.md")));
        assert_eq!(graph.placeholders(), vec![&uri("/b.md")]);

        graph.set_note(note("/b.md", &[])).unwrap();
        assert_eq!(sources(&graph, "/b.md"), vec!["/a.md"]);
        assert!(graph.get_note(&uri("/b.md")).is_some());
        assert!(!graph.is_placeholder(&uri("/b.md")));
        assert!(graph.placeholders().is_empty());
    }

    #[test]
    fn test_replacing_note_recomputes_links() {
        let mut graph = NoteGraph::new();
        graph.set_note(note("/a.md", &["/b.md", "/c.md"])).unwrap();
        graph.set_note(note("/a.md", &["/c.md", "/d.md"])).unwrap();

        assert!(sources(&graph, "/b.md").is_empty());
        assert_eq!(sources(&graph, "/c.md"), vec!["/a.md"]);
        assert_eq!(sources(&graph, "/d.md"), vec!["/a.md"]);
        assert_eq!(graph.links(&uri("/a.md"), Direction::Forward).len(), 2);
        assert!(!graph.is_placeholder(&uri("/b.md")));
    }

    #[test]
    fn test_remove_note_keeps_incoming_links() {
        let mut graph = NoteGraph::new();
        graph.set_note(note("/a.md", &["/b.md"])).unwrap();
        graph.set_note(note("/b.md", &["/c.md"])).unwrap();

        let removed = graph.remove_note(&uri("/b.md")).unwrap();
        assert_eq!(removed.uri, uri("/b.md"));

        assert!(graph.links(&uri("/b.md"), Direction::Forward).is_empty());
        assert!(sources(&graph, "/c.md").is_empty());
        assert_eq!(sources(&graph, "/b.md"), vec!["/a.md"]);
        assert!(graph.is_placeholder(&uri("/b.md")));

        assert!(graph.remove_note(&uri("/b.md")).is_none());
    }

    #[test]
    fn test_duplicate_and_self_links() {
        let mut graph = NoteGraph::new();
        graph
            .set_note(note("/a.md", &["/a.md", "/b.md", "/b.md"]))
            .unwrap();

        assert_eq!(graph.links(&uri("/b.md"), Direction::Backward).len(), 2);
        assert_eq!(graph.backlink_sources(&uri("/b.md")), vec![&uri("/a.md")]);
        assert_eq!(sources(&graph, "/a.md"), vec!["/a.md"]);

        graph.remove_note(&uri("/a.md"));
        assert!(graph.links(&uri("/b.md"), Direction::Backward).is_empty());
        assert!(graph.links(&uri("/a.md"), Direction::Backward).is_empty());
    }

    #[test]
    fn test_middleware_transforms_stored_note() {
        let inject = middleware_fn("inject", |mut note: Note| {
            note.set_property("injectedByMiddleware", true);
            Ok(note)
        });
        let mut graph = create_graph(vec![inject]);

        let stored = graph.set_note(note("/path/to/note.md", &[])).unwrap();
        assert!(stored
            .property("injectedByMiddleware")
            .is_some_and(PropertyValue::is_truthy));

        let fetched = graph.get_note(&uri("/path/to/note.md")).unwrap();
        assert_eq!(fetched.property("injectedByMiddleware"), Some(&PropertyValue::Bool(true)));
    }

    #[test]
    fn test_middleware_applies_in_registration_order() {
        let first = middleware_fn("first", |mut note: Note| {
            note.set_property("order", "first");
            Ok(note)
        });
        let second = middleware_fn("second", |mut note: Note| {
            let prev = note.property("order").and_then(|v| v.as_str()).unwrap_or("").to_string();
            note.set_property("order", format!("{prev},second"));
            Ok(note)
        });
        let mut graph = NoteGraph::with_middleware(vec![first, second]);

        let stored = graph.set_note(note("/a.md", &[])).unwrap();
        assert_eq!(stored.property("order").and_then(|v| v.as_str()), Some("first,second"));
    }

    #[test]
    fn test_middleware_can_add_links() {
        let link_index = middleware_fn("index", |note: Note| {
            let index = NoteLink::new(LinkKind::Wikilink, NoteUri::file("/index.md"));
            Ok(note.with_link(index))
        });
        let mut graph = NoteGraph::with_middleware(vec![link_index]);
        graph.set_note(note("/a.md", &[])).unwrap();

        assert_eq!(sources(&graph, "/index.md"), vec!["/a.md"]);
    }

    #[test]
    fn test_failing_middleware_leaves_graph_unchanged() {
        let reject_drafts = middleware_fn("reject-drafts", |note: Note| {
            if note.property("draft").is_some_and(PropertyValue::is_truthy) {
                return Err(MiddlewareError::rejected("draft"));
            }
            Ok(note)
        });
        let mut graph = NoteGraph::with_middleware(vec![reject_drafts]);
        graph.set_note(note("/a.md", &["/b.md"])).unwrap();

        let draft = note("/a.md", &["/c.md"]).with_property("draft", true);
        let err = graph.set_note(draft).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(err.middleware(), "reject-drafts");

        let stored = graph.get_note(&uri("/a.md")).unwrap();
        assert!(stored.property("draft").is_none());
        assert_eq!(sources(&graph, "/b.md"), vec!["/a.md"]);
        assert!(sources(&graph, "/c.md").is_empty());
    }

    #[test]
    fn test_later_middleware_failure_discards_earlier_output() {
        let stamp = middleware_fn("stamp", |mut note: Note| {
            note.set_property("stamped", true);
            Ok(note)
        });
        let boom = middleware_fn("boom", |_note: Note| {
            Err(MiddlewareError::Failed(anyhow::anyhow!("exploded")))
        });
        let mut graph = NoteGraph::with_middleware(vec![stamp, boom]);

        let err = graph.set_note(note("/a.md", &["/b.md"])).unwrap_err();
        assert_eq!(err.middleware(), "boom");
        assert!(graph.is_empty());
        assert!(graph.links(&uri("/b.md"), Direction::Backward).is_empty());
    }

    #[test]
    fn test_middleware_cannot_change_identifier() {
        let rename = middleware_fn("rename", |mut note: Note| {
            note.uri = NoteUri::file("/elsewhere.md");
            Ok(note)
        });
        let mut graph = NoteGraph::with_middleware(vec![rename]);

        let err = graph.set_note(note("/a.md", &[])).unwrap_err();
        assert!(matches!(err, GraphError::IdentifierChanged { .. }));
        assert!(graph.is_empty());
    }
}
