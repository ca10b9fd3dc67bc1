//! # Loam Core
//!
//! Note model and in-memory link graph.
//!
//! - [`Note`]: parsed markdown note with properties, headings and outgoing links
//! - [`NoteGraph`]: identifier-keyed store with forward/backward link indexes
//! - [`GraphMiddleware`]: transform chain applied to every note before storage
//!
//! ```rust
//! use loam_core::{middleware_fn, LinkKind, Note, NoteGraph, NoteLink, NoteUri, Direction};
//!
//! let stamp = middleware_fn("stamp", |mut note: Note| {
//!     note.set_property("seen", true);
//!     Ok(note)
//! });
//! let mut graph = NoteGraph::with_middleware(vec![stamp]);
//!
//! let a = Note::new(NoteUri::file("/notes/a.md"))
//!     .with_link(NoteLink::new(LinkKind::Wikilink, NoteUri::file("/notes/b.md")));
//! graph.set_note(a).unwrap();
//!
//! let backlinks = graph.links(&NoteUri::file("/notes/b.md"), Direction::Backward);
//! assert_eq!(backlinks.len(), 1);
//! ```

pub mod error;
pub mod graph;
pub mod middleware;
pub mod note;
pub mod properties;
pub mod uri;

pub use error::{GraphError, GraphResult, MiddlewareError};
pub use graph::{create_graph, Direction, GraphLink, NoteGraph};
pub use middleware::{middleware_fn, FnMiddleware, GraphMiddleware};
pub use note::{Heading, LinkKind, Note, NoteLink, NoteSource, Position, Range};
pub use properties::{PropertyMap, PropertyValue};
pub use uri::{NoteUri, UriError, FILE_SCHEME};
