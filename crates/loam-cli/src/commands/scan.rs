use anyhow::Result;
use loam_config::LoamConfig;
use loam_core::Direction;
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::commands::print_json;
use crate::workspace::{NoteFailure, Workspace};

#[derive(Debug, Serialize)]
pub struct NoteRow {
    pub note: String,
    pub title: Option<String>,
    pub links: usize,
    pub backlinks: usize,
}

#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub root: String,
    pub notes: Vec<NoteRow>,
    /// Link targets with no stored note
    pub placeholders: Vec<String>,
    pub failures: Vec<NoteFailure>,
    pub plugins: Vec<String>,
}

impl ScanSummary {
    pub fn from_workspace(workspace: &Workspace) -> Self {
        let graph = &workspace.graph;

        let mut notes: Vec<NoteRow> = graph
            .notes()
            .map(|note| NoteRow {
                note: workspace.relative(&note.uri),
                title: note.title.clone(),
                links: graph.links(&note.uri, Direction::Forward).len(),
                backlinks: graph.links(&note.uri, Direction::Backward).len(),
            })
            .collect();
        notes.sort_by(|a, b| a.note.cmp(&b.note));

        Self {
            root: workspace.root.display().to_string(),
            notes,
            placeholders: graph
                .placeholders()
                .into_iter()
                .map(|uri| workspace.relative(uri))
                .collect(),
            failures: workspace.failures.clone(),
            plugins: workspace
                .plugins
                .extensions
                .iter()
                .map(|r| r.name.clone())
                .collect(),
        }
    }
}

pub async fn execute(config: &LoamConfig, dir: &Path, format: OutputFormat) -> Result<()> {
    let workspace = Workspace::load(dir, config).await?;
    let summary = ScanSummary::from_workspace(&workspace);

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => print_text(&summary),
    }
    Ok(())
}

fn print_text(summary: &ScanSummary) {
    if !summary.plugins.is_empty() {
        println!("plugins: {}", summary.plugins.join(", "));
    }

    for row in &summary.notes {
        let title = row.title.as_deref().unwrap_or("-");
        println!(
            "{}  \"{}\"  links: {}  backlinks: {}",
            row.note, title, row.links, row.backlinks
        );
    }

    for placeholder in &summary.placeholders {
        println!("placeholder: {}", placeholder);
    }

    for failure in &summary.failures {
        println!("failed: {}: {}", failure.path.display(), failure.error);
    }

    println!(
        "{} notes, {} placeholders, {} failures",
        summary.notes.len(),
        summary.placeholders.len(),
        summary.failures.len()
    );
}
