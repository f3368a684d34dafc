//! Scriptorium CLI - Main Entry Point
//!
//! Extracts unlock codes from downloaded manuscripts, solves cipher
//! challenges, and inspects the persisted code history.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scriptorium_core::{default_config_path, ScriptoriumConfig};

mod commands;
mod output;

use commands::{backup, challenge, extract, history, solve};

/// Scriptorium CLI - manuscript portal code tooling
#[derive(Parser)]
#[command(name = "scriptorium")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Challenge API base URL (overrides config and environment)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Code history file (overrides config)
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the unlock code from a downloaded manuscript
    Extract(extract::ExtractArgs),

    /// Solve a cipher challenge from a JSON file or stdin
    Solve(solve::SolveArgs),

    /// Fetch a cipher challenge from the API and solve it
    Challenge(challenge::ChallengeArgs),

    /// Inspect or clear the code history
    #[command(subcommand)]
    History(history::HistoryCommands),

    /// Show the built-in backup codes
    Backup(backup::BackupArgs),

    /// Show version information
    Version,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ScriptoriumConfig> {
        let path = self.config.clone().unwrap_or_else(default_config_path);
        let mut config = ScriptoriumConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display()))?
            .with_env();

        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(history) = &self.history {
            config.paths.history_file = history.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Extract(args) => extract::execute(args, &cli.load_config()?, cli.format)?,
        Commands::Solve(args) => solve::execute(args, cli.format)?,
        Commands::Challenge(args) => challenge::execute(args, &cli.load_config()?, cli.format).await?,
        Commands::History(cmd) => history::execute(cmd, &cli.load_config()?, cli.format)?,
        Commands::Backup(args) => backup::execute(args, cli.format),
        Commands::Version => {
            println!("Scriptorium CLI v{}", scriptorium_core::VERSION);
            println!("Manuscript code extraction and cipher challenge solver");
        }
    }

    Ok(())
}
