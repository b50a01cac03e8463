use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aacbridge::config::{Config, LoggingConfig};
use aacbridge::core::types::SessionStyle;
use aacbridge::transport;

#[derive(Parser)]
#[command(name = "aacbridge")]
#[command(author, version = env!("AACBRIDGE_VERSION"), about = "AAC keyboard bridge to an AI assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the marker directory and serve the keyboard until Ctrl+C
    Run {
        /// Session style to start in (exploration, creative_writing, article_writing, translation, chat)
        #[arg(short, long)]
        style: Option<SessionStyle>,
    },

    /// List saved artifacts, most recent first
    Artifacts {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List saved chats, most recent first
    Chats {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show marker file names in priority order
    Markers,
}

fn init_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let filter = if verbose {
        "aacbridge=debug"
    } else {
        "aacbridge=info"
    };

    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // init-config must work even when the existing file no longer parses
    let config = match cli.command {
        Commands::InitConfig { .. } => Config::default(),
        _ => Config::load(cli.config.as_deref())?,
    };
    init_logging(cli.verbose, &config.logging)?;

    match cli.command {
        Commands::Run { style } => {
            transport::cli::run_bridge(config, style).await?;
        }
        Commands::Artifacts { format } => {
            transport::cli::run_artifacts(&config, &format)?;
        }
        Commands::Chats { format } => {
            transport::cli::run_chats(&config, &format)?;
        }
        Commands::InitConfig { force } => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::config_path()?,
            };
            transport::cli::run_init_config(&path, force)?;
        }
        Commands::Markers => {
            transport::cli::run_markers(&config)?;
        }
    }

    Ok(())
}
