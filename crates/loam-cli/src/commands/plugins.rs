use anyhow::Result;
use loam_config::LoamConfig;
use loam_plugins::{ExtensionLoader, LoadReport};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::commands::print_json;

#[derive(Debug, Serialize)]
pub struct PluginRow {
    pub name: String,
    pub source: PathBuf,
    pub parser: bool,
    pub graph_middleware: bool,
    pub capabilities: String,
}

#[derive(Debug, Serialize)]
pub struct SkippedRow {
    pub path: PathBuf,
    pub reason: String,
    pub disabled: bool,
}

#[derive(Debug, Serialize)]
pub struct PluginsOutput {
    pub enabled: bool,
    pub loaded: Vec<PluginRow>,
    pub skipped: Vec<SkippedRow>,
}

impl PluginsOutput {
    pub fn from_report(enabled: bool, report: &LoadReport) -> Self {
        Self {
            enabled,
            loaded: report
                .extensions
                .iter()
                .map(|r| PluginRow {
                    name: r.name.clone(),
                    source: r.source.clone(),
                    parser: r.parser.is_some(),
                    graph_middleware: r.graph_middleware.is_some(),
                    capabilities: r.capabilities(),
                })
                .collect(),
            skipped: report
                .skipped
                .iter()
                .map(|e| SkippedRow {
                    path: e.path().clone(),
                    reason: e.to_string(),
                    disabled: e.is_disabled(),
                })
                .collect(),
        }
    }
}

pub async fn execute(config: &LoamConfig, format: OutputFormat) -> Result<()> {
    let report = ExtensionLoader::new().load(config).await;
    let output = PluginsOutput::from_report(config.plugins_enabled(), &report);

    match format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Text => print_text(&output),
    }
    Ok(())
}

fn print_text(output: &PluginsOutput) {
    if !output.enabled {
        println!("Local plugins are disabled (set experimental.localPlugins.enabled = true)");
        return;
    }

    if output.loaded.is_empty() {
        println!("No plugins loaded");
    }
    for row in &output.loaded {
        println!("{}  [{}]  {}", row.name, row.capabilities, row.source.display());
    }

    for row in &output.skipped {
        let label = if row.disabled { "disabled" } else { "skipped" };
        println!("{}: {}", label, row.reason);
    }
}
