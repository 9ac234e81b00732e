//! Shard merger CLI application.
//!
//! Combines every persisted shard into the single catalog file the query
//! tool reads.

use anyhow::{Context, Result};
use clap::Parser;
use shared::{Config, DataPaths, ShardStore};
use std::path::PathBuf;
use tracing::{info, warn};

mod merge;

use merge::Merger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    shared::logging::init(shared::LogConfig {
        log_dir: config.log_dir().to_string_lossy().to_string(),
        component: "emote-merger".to_string(),
        default_level: log_level,
        console: config.logging.console,
        file: config.logging.file,
        json_format: config.logging.json_format,
    })?;

    info!("Emote merger starting");

    let data_paths = DataPaths::new(config.data_dir());
    let store = ShardStore::new(data_paths.shards_dir())
        .context("Failed to initialize shard store")?;

    let merger = Merger::new(store, config.merger.batch_count);
    let (catalog, stats) = merger.merge_all().context("Merge failed")?;

    let catalog_path = data_paths.catalog_file();
    merger
        .write_catalog(&catalog, &catalog_path)
        .context("Failed to write catalog")?;

    // Display final statistics
    info!("=== Merge Complete ===");
    info!("Shards found: {}", stats.shards_total);
    info!("Shards merged: {}", stats.shards_merged);
    info!("Corrupt shards skipped: {}", stats.shards_corrupt);
    info!("Distinct codes: {}", stats.codes);
    info!("Id entries: {}", stats.ids);

    if stats.shards_corrupt > 0 {
        warn!(
            corrupt = stats.shards_corrupt,
            "Corrupt shards were skipped; delete them and re-crawl to recover"
        );
    }

    info!("Emote merger finished");

    Ok(())
}
