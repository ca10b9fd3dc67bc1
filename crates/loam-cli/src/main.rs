use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use loam_cli::{
    cli::{Cli, Commands},
    commands, config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,loam_cli={0},loam_plugins={0},loam_parser={0},loam_core={0},loam_config={0}",
            log_level
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Plugins => commands::plugins::execute(&config, cli.format).await?,
        Commands::Parse { file } => commands::parse::execute(&config, &file, cli.format).await?,
        Commands::Scan { dir } => commands::scan::execute(&config, &dir, cli.format).await?,
        Commands::Backlinks { dir, note } => {
            commands::backlinks::execute(&config, &dir, &note, cli.format).await?
        }
    }

    Ok(())
}
