//! CLI entry points

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

use crate::channels::{self, Clipboard, SystemClipboard};
use crate::config::Config;
use crate::core::types::SessionStyle;
use crate::dispatch::{Backend, Channels, Dispatcher, Marker};
use crate::llm;
use crate::storage::{format_timestamp, ArtifactStore, ChatStore, RecordEntry};

/// Run the dispatcher until Ctrl+C
pub async fn run_bridge(mut config: Config, style: Option<SessionStyle>) -> Result<()> {
    if let Some(style) = style {
        config.dispatcher.initial_style = style;
    }

    let provider = llm::create_provider(&config)?;
    let clipboard: Box<dyn Clipboard> =
        Box::new(SystemClipboard::new().context("Clipboard unavailable")?);
    let channels = Channels {
        clipboard,
        speech: channels::speech::from_command(&config.speech.command),
        notifier: channels::notify::from_command(&config.notify.command),
    };

    let backend =
        Backend::new(&config, provider, channels).context("Failed to open the record stores")?;
    let mut dispatcher = Dispatcher::new(
        config.paths.comm_dir(),
        Duration::from_millis(config.dispatcher.poll_interval_ms),
        backend,
    )
    .with_context(|| {
        format!(
            "Failed to create marker directory {}",
            config.paths.comm_dir().display()
        )
    })?;
    dispatcher.clear_all();

    let stop = dispatcher.stop_handle();
    ctrlc::set_handler(move || {
        tracing::info!("Interrupt received, stopping");
        stop.stop();
    })
    .context("Failed to install Ctrl+C handler")?;

    println!(
        "{} {}",
        "aacbridge listening on".bold().cyan(),
        dispatcher.comm_dir().display()
    );
    dispatcher.run().await;
    Ok(())
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Style")]
    style: String,
    #[tabled(rename = "Saved")]
    saved: String,
}

fn print_records(title: &str, entries: &[RecordEntry], format: &str, dir: &Path) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    println!("{}", format!("=== {title} ===").bold().cyan());
    println!();

    if entries.is_empty() {
        println!("Nothing saved yet.");
    } else {
        let rows: Vec<RecordRow> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| RecordRow {
                rank: i + 1,
                name: entry.name.clone(),
                style: entry
                    .style
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                saved: format_timestamp(&entry.saved_at),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    println!();
    println!("Directory: {}", dir.display());
    Ok(())
}

/// List saved artifacts, most recent first
pub fn run_artifacts(config: &Config, format: &str) -> Result<()> {
    let store = ArtifactStore::new(config.paths.artifacts_dir())?;
    let entries = store.list()?;
    print_records("Artifacts", &entries, format, store.dir())
}

/// List saved chats, most recent first
pub fn run_chats(config: &Config, format: &str) -> Result<()> {
    let store = ChatStore::new(config.paths.chats_dir())?;
    let entries = store.list()?;
    print_records("Chats", &entries, format, store.dir())
}

/// Write the default configuration to `path`
pub fn run_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save(path)?;
    println!("{} {}", "✓".green(), path.display());
    Ok(())
}

/// Print the marker vocabulary in priority order
pub fn run_markers(config: &Config) -> Result<()> {
    #[derive(Tabled)]
    struct MarkerRow {
        #[tabled(rename = "Priority")]
        priority: usize,
        #[tabled(rename = "Marker")]
        name: String,
        #[tabled(rename = "Reads number")]
        takes_number: String,
        #[tabled(rename = "Path")]
        path: String,
    }

    let comm_dir = config.paths.comm_dir();

    let rows: Vec<MarkerRow> = Marker::ALL
        .iter()
        .enumerate()
        .map(|(i, marker)| MarkerRow {
            priority: i + 1,
            name: marker.file_name().to_string(),
            takes_number: if marker.takes_number() { "yes" } else { "" }.to_string(),
            path: marker.path_in(&comm_dir).display().to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!();
    println!("Marker directory: {}", comm_dir.display());
    Ok(())
}
