//! Loaded extension records

use loam_core::GraphMiddleware;
use loam_parser::ParserExtension;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// One successfully loaded plugin.
///
/// A record may contribute a parser extension, a graph middleware, both, or
/// neither.
#[derive(Clone)]
pub struct ExtensionRecord {
    pub name: String,
    /// Folder (or script) the record was loaded from
    pub source: PathBuf,
    pub parser: Option<Arc<dyn ParserExtension>>,
    pub graph_middleware: Option<Arc<dyn GraphMiddleware>>,
}

impl ExtensionRecord {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            parser: None,
            graph_middleware: None,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn ParserExtension>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_graph_middleware(mut self, middleware: Arc<dyn GraphMiddleware>) -> Self {
        self.graph_middleware = Some(middleware);
        self
    }

    /// Short capability summary, e.g. `parser+middleware`
    pub fn capabilities(&self) -> String {
        let mut caps = Vec::new();
        if self.parser.is_some() {
            caps.push("parser");
        }
        if self.graph_middleware.is_some() {
            caps.push("middleware");
        }
        if caps.is_empty() {
            "none".to_string()
        } else {
            caps.join("+")
        }
    }
}

impl fmt::Debug for ExtensionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRecord")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("parser", &self.parser.as_ref().map(|p| p.name().to_string()))
            .field(
                "graph_middleware",
                &self.graph_middleware.as_ref().map(|m| m.name().to_string()),
            )
            .finish()
    }
}

/// Parser extensions of `records`, in record order
pub fn parser_extensions(records: &[ExtensionRecord]) -> Vec<Arc<dyn ParserExtension>> {
    records.iter().filter_map(|r| r.parser.clone()).collect()
}

/// Graph middleware of `records`, in record order
pub fn graph_middleware(records: &[ExtensionRecord]) -> Vec<Arc<dyn GraphMiddleware>> {
    records
        .iter()
        .filter_map(|r| r.graph_middleware.clone())
        .collect()
}
