//! Building a note graph from a folder on disk

use anyhow::{Context, Result};
use loam_config::LoamConfig;
use loam_core::{create_graph, NoteGraph, NoteUri};
use loam_parser::{create_parser, MarkdownParser};
use loam_plugins::{graph_middleware, parser_extensions, ExtensionLoader, LoadReport};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// A note that could not be read, parsed or stored
#[derive(Debug, Clone, Serialize)]
pub struct NoteFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Parser and graph wired with the configured plugins
pub struct Pipeline {
    pub parser: MarkdownParser,
    pub graph: NoteGraph,
    pub plugins: LoadReport,
}

impl Pipeline {
    pub async fn from_config(config: &LoamConfig) -> Self {
        let plugins = ExtensionLoader::new().load(config).await;
        let parser = create_parser(parser_extensions(&plugins.extensions), &config.parser);
        let graph = create_graph(graph_middleware(&plugins.extensions));
        Self {
            parser,
            graph,
            plugins,
        }
    }
}

/// Graph of every note under a root folder
pub struct Workspace {
    pub root: PathBuf,
    pub graph: NoteGraph,
    pub plugins: LoadReport,
    pub failures: Vec<NoteFailure>,
}

impl Workspace {
    /// Parse and store every note under `root`.
    ///
    /// A note that fails is recorded in `failures` and the scan goes on.
    pub async fn load(root: &Path, config: &LoamConfig) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Notes folder not found: {}", root.display()))?;

        let Pipeline {
            parser,
            mut graph,
            plugins,
        } = Pipeline::from_config(config).await;

        let extension = config.parser.default_note_extension.trim_start_matches('.');
        let mut failures = Vec::new();

        for path in note_files(&root, extension) {
            let uri = NoteUri::file(&path);
            let result = async {
                let text = tokio::fs::read_to_string(&path).await?;
                let note = parser.parse(&uri, &text)?;
                graph.set_note(note)?;
                anyhow::Ok(())
            }
            .await;

            if let Err(e) = result {
                warn!(path = %path.display(), "Skipping note: {}", e);
                failures.push(NoteFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }

        info!(
            root = %root.display(),
            notes = graph.len(),
            failures = failures.len(),
            "Workspace loaded"
        );

        Ok(Self {
            root,
            graph,
            plugins,
            failures,
        })
    }

    /// Identifier for `note`, a path relative to the root with optional extension
    pub fn resolve(&self, note: &str, default_extension: &str) -> NoteUri {
        NoteUri::file(self.root.join(note)).with_default_extension(default_extension)
    }

    /// Display form of `uri` relative to the root when possible
    pub fn relative(&self, uri: &NoteUri) -> String {
        let path = uri.to_path_buf();
        path.strip_prefix(&self.root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| uri.to_string())
    }
}

/// Note files under `root` with `extension`, sorted, skipping hidden entries
pub fn note_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .map(DirEntry::into_path)
        .collect();

    files.sort();
    debug!(root = %root.display(), count = files.len(), "Discovered note files");
    files
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
