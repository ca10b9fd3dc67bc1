use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser)]
#[command(name = "loam")]
#[command(about = "loam - build and query a graph of interlinked markdown notes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (debug level for loam crates)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/loam/config.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load configured plugins and report what each contributes
    Plugins,

    /// Parse a single note and print its structure
    Parse {
        /// Markdown file to parse
        file: PathBuf,
    },

    /// Build the graph for a folder of notes and summarize it
    Scan {
        /// Root folder of the notes
        dir: PathBuf,
    },

    /// List notes linking to a note
    Backlinks {
        /// Root folder of the notes
        dir: PathBuf,

        /// Target note, relative to DIR (extension optional)
        note: String,
    },
}
