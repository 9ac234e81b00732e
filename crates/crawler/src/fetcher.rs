//! Per-key shard fetching.
//!
//! One fetch paginates the search API for a single query key until
//! exhaustion, accumulating code -> ids associations, and persists the
//! result as that key's shard. A key whose shard is already on disk is
//! skipped without any network traffic, which is what makes an interrupted
//! crawl resumable.

use crate::api::{ApiError, EmoteRecord, Page, SearchApi};
use shared::{Shard, ShardStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Errors from fetching one key's shard
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("query {key:?} stalled at offset {offset} after {attempts} rate-limited attempts")]
    Stalled {
        key: String,
        offset: usize,
        attempts: u32,
    },

    #[error("crawl cancelled")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How one key completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Shard fetched and persisted
    Fetched { codes: usize, ids: usize },
    /// Shard was already persisted; no network calls were made
    Skipped,
}

/// Fetches and persists the shard for one query key at a time
pub struct ShardFetcher<C> {
    api: C,
    store: ShardStore,
    /// Page size the remote honors; a short page ends pagination
    page_size: usize,
    /// Delay before retrying a rate-limited offset
    backoff: Duration,
    /// Attempts per offset before the key is reported stalled
    max_page_attempts: u32,
    /// Cooperative cancellation flag, checked between pages
    shutdown: Arc<AtomicBool>,
}

impl<C: SearchApi> ShardFetcher<C> {
    pub fn new(
        api: C,
        store: ShardStore,
        page_size: usize,
        backoff: Duration,
        max_page_attempts: u32,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            api,
            store,
            page_size,
            backoff,
            max_page_attempts,
            shutdown,
        }
    }

    /// Crawl one query key to exhaustion and persist its shard.
    ///
    /// Returns [`FetchOutcome::Skipped`] without touching the network when
    /// the shard is already on disk.
    pub async fn fetch(&self, key: &str) -> Result<FetchOutcome, FetchError> {
        if self.store.exists(key) {
            debug!(key, "Shard already persisted, skipping");
            return Ok(FetchOutcome::Skipped);
        }

        let mut shard = Shard::new();
        let mut offset = 0;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(FetchError::Cancelled);
            }

            let records = self.page_with_backoff(key, offset).await?;
            let received = records.len();

            for EmoteRecord { code, id } in records {
                shard.push(&code, id);
            }

            // A short page means the result set is exhausted
            if received < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        self.store.save(key, &shard)?;
        debug!(
            key,
            codes = shard.code_count(),
            ids = shard.id_count(),
            "Shard fetched"
        );

        Ok(FetchOutcome::Fetched {
            codes: shard.code_count(),
            ids: shard.id_count(),
        })
    }

    /// Fetch one page, retrying the same offset after a fixed delay while
    /// the remote keeps signalling throttling
    async fn page_with_backoff(
        &self,
        key: &str,
        offset: usize,
    ) -> Result<Vec<EmoteRecord>, FetchError> {
        let mut attempts = 0u32;
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(FetchError::Cancelled);
            }

            match self.api.search_page(key, offset).await? {
                Page::Records(records) => return Ok(records),
                Page::RateLimited => {
                    attempts += 1;
                    if attempts >= self.max_page_attempts {
                        return Err(FetchError::Stalled {
                            key: key.to_string(),
                            offset,
                            attempts,
                        });
                    }
                    warn!(key, offset, attempts, "Rate limited, backing off");
                    sleep(self.backoff).await;
                }
            }
        }
    }
}
