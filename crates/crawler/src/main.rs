//! Emote crawler CLI application.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use emote_crawler::{queries, CrawlCoordinator, CrawlReport, SearchClient, ShardFetcher};
use shared::{Config, DataPaths, ShardStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Number of concurrent fetch workers
    #[arg(short = 'w', long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
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
        component: "emote-crawler".to_string(),
        default_level: log_level,
        console: config.logging.console,
        file: config.logging.file,
        json_format: config.logging.json_format,
    })?;

    info!("Emote crawler starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    // Initialize data paths
    let data_paths = DataPaths::new(config.data_dir());
    data_paths
        .create_dirs()
        .context("Failed to create data directories")?;

    // Initialize shard store
    let store = ShardStore::new(data_paths.shards_dir())
        .context("Failed to initialize shard store")?;
    let existing = store.list_keys().context("Failed to list shards")?.len();
    info!(existing_shards = existing, "Shard store ready");

    // Initialize API client
    let client = SearchClient::new(&config.crawler).context("Failed to create search client")?;

    // Cooperative shutdown on Ctrl-C
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, stopping after in-flight keys");
                shutdown.store(true, Ordering::Relaxed);
            }
        });
    }

    let fetcher = ShardFetcher::new(
        client,
        store,
        config.crawler.page_size,
        Duration::from_secs(config.crawler.backoff_secs),
        config.crawler.max_page_attempts,
        Arc::clone(&shutdown),
    );

    let workers = args.workers.unwrap_or(config.crawler.workers);
    let coordinator = CrawlCoordinator::new(fetcher, workers, shutdown);

    let keys = queries::enumerate();
    info!(
        total_keys = keys.len(),
        workers,
        "Starting brute-force crawl"
    );

    let started_at = Utc::now();
    let stats = coordinator.run(keys).await.context("Crawl failed")?;
    let finished_at = Utc::now();

    // Persist the crawl report next to the shards
    let report = CrawlReport::new(stats.clone(), started_at, finished_at);
    let report_path = data_paths.crawl_report_file();
    let content =
        serde_json::to_string_pretty(&report).context("Failed to serialize crawl report")?;
    std::fs::write(&report_path, content)
        .with_context(|| format!("Failed to write crawl report: {}", report_path.display()))?;
    info!(report = %report_path.display(), "Crawl report written");

    // Display final statistics
    info!("=== Crawl Complete ===");
    info!("Keys total: {}", stats.total);
    info!("Fetched: {}", stats.fetched);
    info!("Skipped (already persisted): {}", stats.skipped);
    info!("Cancelled: {}", stats.cancelled);
    info!("Failed: {}", stats.failures.len());

    if !stats.failures.is_empty() {
        warn!(
            failed = stats.failures.len(),
            "Some keys did not complete; re-run to retry them"
        );
    }

    info!("Emote crawler finished");

    Ok(())
}
