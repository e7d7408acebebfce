//! wiktminer: pronunciation miner for Wiktionary dumps

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::FmtSubscriber;
use wiktminer::config::{Config, LogFormat, LogLevel, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "wiktminer")]
#[command(about = "Mine word/IPA pairs from MediaWiki (Wiktionary) XML dumps")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract transcriptions from a dump
    Mine(commands::MineArgs),

    /// Split a dump into standalone chunk files
    Split(commands::SplitArgs),

    /// List built-in grammars
    Grammars,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // Setup logging
    let level = LogLevel::from_verbosity(cli.verbose)
        .unwrap_or(config.logging.level)
        .to_tracing();

    match config.logging.format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(false)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    match cli.command {
        Commands::Mine(args) => commands::mine(config, args),
        Commands::Split(args) => commands::split(config, args),
        Commands::Grammars => commands::list_grammars(),
    }
}
