use anyhow::Result;
use loam_config::LoamConfig;
use loam_core::{Direction, NoteUri};
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::commands::print_json;
use crate::workspace::Workspace;

#[derive(Debug, Serialize)]
pub struct BacklinkRow {
    pub source: String,
    /// One-based line of the link in the source note
    pub line: u32,
    pub raw: String,
}

/// Links into `target`, ordered by source then line
pub fn collect(workspace: &Workspace, target: &NoteUri) -> Vec<BacklinkRow> {
    let mut rows: Vec<BacklinkRow> = workspace
        .graph
        .links(target, Direction::Backward)
        .iter()
        .map(|link| BacklinkRow {
            source: workspace.relative(&link.source),
            line: link.link.range.start.line + 1,
            raw: link.link.raw.clone(),
        })
        .collect();
    rows.sort_by(|a, b| a.source.cmp(&b.source).then(a.line.cmp(&b.line)));
    rows
}

pub async fn execute(
    config: &LoamConfig,
    dir: &Path,
    note: &str,
    format: OutputFormat,
) -> Result<()> {
    let workspace = Workspace::load(dir, config).await?;
    let target = workspace.resolve(note, &config.parser.default_note_extension);
    let rows = collect(&workspace, &target);

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No backlinks to {}", workspace.relative(&target));
            }
            for row in &rows {
                println!("{}:{}  {}", row.source, row.line, row.raw);
            }
        }
    }
    Ok(())
}
