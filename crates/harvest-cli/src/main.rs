//! `harvest` — passive device telemetry logger.
//!
//! Reads observations from platform event sources (one JSON object per line)
//! into a local SQLite file, and exports that file for offline analysis.
//!
//! # Usage
//!
//! ```
//! adapter | harvest record
//! harvest --database ~/DataHarvest.db record --input events.ndjson
//! harvest export --dest ~/Downloads
//! ```

mod ingest;
mod settings;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use harvest_core::source::{LocationRequest, WifiAction};
use harvest_store_sqlite::SqliteStore;
use tokio::io::BufReader;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{Settings, ensure_db_dir, expand_tilde};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "harvest", version, about = "Passive device telemetry logger")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "harvest.toml")]
  config: PathBuf,

  /// Database file (overrides `database_path`).
  #[arg(long, value_name = "FILE")]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Append observations to the database. Reads stdin unless `--input` is
  /// given.
  Record {
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,
  },

  /// Copy the database file into the export directory.
  Export {
    /// Destination directory (overrides `export_dir`).
    #[arg(short, long, value_name = "DIR")]
    dest: Option<PathBuf>,
  },

  /// Print the subscriptions a platform adapter should register.
  Sources,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  // stdout carries command output; logs go to stderr.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(database) = &cli.database {
    settings.database_path = expand_tilde(database);
  }

  match cli.command {
    Command::Record { input } => record(&settings, input).await,
    Command::Export { dest } => export(&settings, dest).await,
    Command::Sources => sources(),
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  ensure_db_dir(&settings.database_path)?;
  SqliteStore::open(&settings.database_path, settings.store_config())
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.database_path))
}

async fn record(settings: &Settings, input: Option<PathBuf>) -> anyhow::Result<ExitCode> {
  let store = open_store(settings).await?;

  let summary = match input {
    Some(path) => {
      let file = tokio::fs::File::open(&path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
      ingest::ingest(&store, BufReader::new(file)).await
    }
    None => ingest::ingest(&store, BufReader::new(tokio::io::stdin())).await,
  }
  .context("failed to read observations")?;

  tracing::info!(
    lines = summary.lines,
    written = summary.written,
    incomplete = summary.incomplete,
    rejected = summary.rejected,
    failed = summary.failed,
    "ingest finished"
  );
  Ok(ExitCode::SUCCESS)
}

async fn export(settings: &Settings, dest: Option<PathBuf>) -> anyhow::Result<ExitCode> {
  let store = open_store(settings).await?;
  let dest_dir = dest.map_or_else(|| settings.export_dir.clone(), |d| expand_tilde(&d));

  // The store has already logged the failure; nothing more is surfaced.
  match store.export_to(&dest_dir).await {
    Ok(path) => {
      println!("{}", path.display());
      Ok(ExitCode::SUCCESS)
    }
    Err(_) => Ok(ExitCode::FAILURE),
  }
}

fn sources() -> anyhow::Result<ExitCode> {
  let broadcasts: Vec<_> = WifiAction::ALL
    .iter()
    .map(|a| serde_json::json!({ "action": a.as_str(), "kind": a.event_kind().as_str() }))
    .collect();
  let out = serde_json::json!({
    "location":   LocationRequest::default(),
    "broadcasts": broadcasts,
  });
  println!("{}", serde_json::to_string_pretty(&out)?);
  Ok(ExitCode::SUCCESS)
}
