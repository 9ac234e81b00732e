//! Crawl orchestration.
//!
//! Launches one fetch task per query key under a worker-pool bound, tracks
//! shared progress, and collects per-key failures so one bad key never
//! takes down the rest of the crawl.

use crate::api::SearchApi;
use crate::fetcher::{FetchError, FetchOutcome, ShardFetcher};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info, warn};

/// Emit a progress event every this many completed keys
const PROGRESS_EVERY: usize = 250;

/// A key that failed to fetch
#[derive(Debug, Clone, Serialize)]
pub struct KeyFailure {
    pub key: String,
    pub error: String,
}

/// Statistics for one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    pub total: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub failures: Vec<KeyFailure>,
}

impl CrawlStats {
    /// Keys that completed, one way or another
    pub fn completed(&self) -> usize {
        self.fetched + self.skipped + self.cancelled + self.failures.len()
    }
}

/// Crawl summary persisted next to the shards
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub failures: Vec<KeyFailure>,
}

impl CrawlReport {
    pub fn new(stats: CrawlStats, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at,
            total: stats.total,
            fetched: stats.fetched,
            skipped: stats.skipped,
            cancelled: stats.cancelled,
            failures: stats.failures,
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    completed: usize,
    fetched: usize,
    skipped: usize,
    cancelled: usize,
    failures: Vec<KeyFailure>,
}

/// Runs the fetcher over all keys under a concurrency bound
pub struct CrawlCoordinator<C> {
    fetcher: Arc<ShardFetcher<C>>,
    workers: usize,
    shutdown: Arc<AtomicBool>,
}

impl<C: SearchApi + 'static> CrawlCoordinator<C> {
    pub fn new(fetcher: ShardFetcher<C>, workers: usize, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            workers: workers.max(1),
            shutdown,
        }
    }

    /// Crawl every key, returning once each launched key has completed
    pub async fn run(&self, keys: Vec<String>) -> Result<CrawlStats> {
        let total = keys.len();
        info!(total, workers = self.workers, "Starting crawl");

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let progress = Arc::new(Mutex::new(Progress::default()));

        let mut tasks = Vec::with_capacity(total);
        for key in keys {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Shutdown requested, not launching remaining keys");
                break;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("Worker semaphore closed")?;
            let fetcher = Arc::clone(&self.fetcher);
            let progress = Arc::clone(&progress);

            let task = tokio::spawn(async move {
                let result = fetcher.fetch(&key).await;

                let mut guard = progress.lock().await;
                guard.completed += 1;
                match result {
                    Ok(FetchOutcome::Fetched { codes, ids }) => {
                        guard.fetched += 1;
                        debug!(key = %key, codes, ids, "Key complete");
                    }
                    Ok(FetchOutcome::Skipped) => {
                        guard.skipped += 1;
                    }
                    Err(FetchError::Cancelled) => {
                        guard.cancelled += 1;
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Key failed");
                        guard.failures.push(KeyFailure {
                            key,
                            error: e.to_string(),
                        });
                    }
                }

                if guard.completed % PROGRESS_EVERY == 0 || guard.completed == total {
                    info!(
                        completed = guard.completed,
                        total,
                        progress = format!("{:.2}%", guard.completed as f64 / total as f64 * 100.0),
                        "Crawl progress"
                    );
                }

                drop(permit);
            });
            tasks.push(task);
        }

        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Fetch task panicked");
            }
        }

        let guard = progress.lock().await;
        let stats = CrawlStats {
            total,
            fetched: guard.fetched,
            skipped: guard.skipped,
            cancelled: guard.cancelled,
            failures: guard.failures.clone(),
        };
        drop(guard);

        for failure in &stats.failures {
            warn!(key = %failure.key, error = %failure.error, "Key did not complete");
        }

        info!(
            total = stats.total,
            fetched = stats.fetched,
            skipped = stats.skipped,
            cancelled = stats.cancelled,
            failed = stats.failures.len(),
            "Crawl complete"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{records, MockApi, MockResponse};
    use shared::ShardStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn coordinator(
        api: MockApi,
        dir: &TempDir,
        workers: usize,
        shutdown: Arc<AtomicBool>,
    ) -> CrawlCoordinator<MockApi> {
        let store = ShardStore::new(dir.path()).unwrap();
        let fetcher = ShardFetcher::new(
            api,
            store,
            100,
            Duration::from_millis(5),
            3,
            Arc::clone(&shutdown),
        );
        CrawlCoordinator::new(fetcher, workers, shutdown)
    }

    #[tokio::test]
    async fn test_all_keys_complete() {
        let api = MockApi::new();
        for key in ["aaa", "aab", "aac"] {
            api.enqueue(key, 0, MockResponse::Page(records(0, 3)));
        }

        let dir = TempDir::new().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let coordinator = coordinator(api, &dir, 2, shutdown);

        let stats = coordinator
            .run(vec!["aaa".into(), "aab".into(), "aac".into()])
            .await
            .unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.fetched, 3);
        assert_eq!(stats.completed(), 3);
        assert!(stats.failures.is_empty());

        let store = ShardStore::new(dir.path()).unwrap();
        assert_eq!(store.list_keys().unwrap(), vec!["aaa", "aab", "aac"]);
    }

    #[tokio::test]
    async fn test_existing_shards_count_as_completed() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::new(dir.path()).unwrap();
        store.save("aaa", &shared::Shard::new()).unwrap();

        let api = MockApi::new();
        api.enqueue("aab", 0, MockResponse::Page(records(0, 1)));

        let shutdown = Arc::new(AtomicBool::new(false));
        let coordinator = coordinator(api, &dir, 4, shutdown);

        let stats = coordinator
            .run(vec!["aaa".into(), "aab".into()])
            .await
            .unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.fetched, 1);
        assert_eq!(stats.completed(), 2);
    }

    #[tokio::test]
    async fn test_one_failing_key_does_not_abort_siblings() {
        let api = MockApi::new();
        api.enqueue("aaa", 0, MockResponse::Page(records(0, 2)));
        api.enqueue("aab", 0, MockResponse::Error);
        api.enqueue("aac", 0, MockResponse::Page(records(0, 2)));

        let dir = TempDir::new().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let coordinator = coordinator(api, &dir, 1, shutdown);

        let stats = coordinator
            .run(vec!["aaa".into(), "aab".into(), "aac".into()])
            .await
            .unwrap();

        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.failures.len(), 1);
        assert_eq!(stats.failures[0].key, "aab");

        let store = ShardStore::new(dir.path()).unwrap();
        assert_eq!(store.list_keys().unwrap(), vec!["aaa", "aac"]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_launching_keys() {
        let api = MockApi::new();
        let dir = TempDir::new().unwrap();
        let shutdown = Arc::new(AtomicBool::new(true));
        let coordinator = coordinator(api, &dir, 2, shutdown);

        let stats = coordinator
            .run(vec!["aaa".into(), "aab".into()])
            .await
            .unwrap();

        assert_eq!(stats.fetched, 0);
        assert_eq!(stats.completed(), 0);
    }
}
