use anyhow::{Context, Result};
use loam_config::LoamConfig;
use loam_core::{Note, NoteUri};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::commands::print_json;
use crate::workspace::Pipeline;

pub async fn execute(config: &LoamConfig, file: &Path, format: OutputFormat) -> Result<()> {
    let path = file
        .canonicalize()
        .with_context(|| format!("Note not found: {}", file.display()))?;
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let pipeline = Pipeline::from_config(config).await;
    let note = pipeline.parser.parse(&NoteUri::file(&path), &text)?;

    match format {
        OutputFormat::Json => print_json(&note)?,
        OutputFormat::Text => print_text(&note),
    }
    Ok(())
}

fn print_text(note: &Note) {
    println!("{}", note.uri);
    if let Some(title) = &note.title {
        println!("title: {}", title);
    }
    if !note.tags.is_empty() {
        println!("tags: {}", note.tags.join(", "));
    }
    for (key, value) in &note.properties {
        println!("property {}: {}", key, value);
    }
    for heading in &note.headings {
        println!("{} {}", "#".repeat(heading.level as usize), heading.text);
    }
    for link in &note.links {
        println!(
            "link {}:{} {} -> {}",
            link.range.start.line + 1,
            link.range.start.character + 1,
            link.raw,
            link.target
        );
    }
}
