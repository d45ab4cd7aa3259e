//! # feedsync
//!
//! Command-line front end for the offline-first news sync engine.
//!
//! ## Commands
//!
//! - `sync`: Download the latest changes once
//! - `watch`: Sync at startup and periodically, retrying failures
//! - `status`: Show local version record and counts
//! - `topics`: List stored topics
//! - `news`: List stored news resources
//! - `search`: Search stored topics and news
//!
//! ## Example
//!
//! ```bash
//! # Sync from the bundled demo data set
//! feedsync sync --demo
//!
//! # Browse offline
//! feedsync topics
//! feedsync news --topic 3
//! feedsync search testing
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{browse, search, status, sync, watch, RemoteArgs};
use config::Config;

/// Offline-first news feed sync.
#[derive(Parser, Debug)]
#[command(name = "feedsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory holding the database and feedsync.toml
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (default: <data-dir>/feedsync.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the latest changes once
    Sync {
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Sync at startup and periodically until Ctrl-C
    Watch {
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Show local sync status
    Status,

    /// List stored topics
    Topics,

    /// List stored news resources, newest first
    News {
        /// Only news for this topic id
        #[arg(long)]
        topic: Option<String>,
    },

    /// Search stored topics and news
    Search {
        /// Text to look for
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let config = Config::load(cli.config.as_deref(), &data_dir)?;
    init_logging(&config.logging.filter);

    match cli.command {
        Commands::Sync { remote } => {
            if !sync::run(&config, &data_dir, &remote).await? {
                anyhow::bail!("Sync failed");
            }
        }
        Commands::Watch { remote } => {
            watch::run(&config, &data_dir, &remote).await?;
        }
        Commands::Status => {
            status::run(&config, &data_dir).await?;
        }
        Commands::Topics => {
            browse::topics(&config, &data_dir).await?;
        }
        Commands::News { topic } => {
            browse::news(&config, &data_dir, topic.as_deref()).await?;
        }
        Commands::Search { query } => {
            search::run(&config, &data_dir, &query).await?;
        }
    }

    Ok(())
}

/// Log to stderr so command output on stdout stays clean.
fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default data directory for feedsync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "feedsync", "feedsync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
