//! Search API client with rate limiting and retry logic.

use super::rate_limiter::RateLimiter;
use super::types::EmoteRecord;
use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use shared::config::CrawlerConfig;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

/// One page of search results, or the remote's throttling signal
#[derive(Debug, Clone)]
pub enum Page {
    Records(Vec<EmoteRecord>),
    /// The remote answered with a non-JSON body or 429; the caller should
    /// back off and retry the same offset
    RateLimited,
}

/// Errors from the search API after in-client retries are exhausted
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request for {query:?} offset {offset} failed: {source}")]
    Transport {
        query: String,
        offset: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode page for {query:?} offset {offset}: {source}")]
    Decode {
        query: String,
        offset: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for {query:?} offset {offset} failed with status {status}")]
    Status {
        query: String,
        offset: usize,
        status: StatusCode,
    },
}

/// The seam between the fetcher and the remote search endpoint
pub trait SearchApi: Send + Sync {
    /// Fetch one result page for `query` starting at `offset`
    fn search_page(
        &self,
        query: &str,
        offset: usize,
    ) -> impl Future<Output = Result<Page, ApiError>> + Send;
}

/// Shared-emote search client
pub struct SearchClient {
    /// HTTP client
    client: Client,
    /// Search endpoint URL
    base_url: String,
    /// Records requested per page
    page_size: usize,
    /// Request pacing shared across workers
    rate_limiter: RateLimiter,
    /// Maximum retries for failed requests
    max_retries: u32,
    /// Base delay for retry (exponential backoff)
    retry_delay_ms: u64,
}

impl SearchClient {
    /// Create a new search client from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("emote-pipeline/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            page_size: config.page_size,
            rate_limiter: RateLimiter::new(config.requests_per_second),
            max_retries: config.max_transport_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }
}

impl SearchApi for SearchClient {
    async fn search_page(&self, query: &str, offset: usize) -> Result<Page, ApiError> {
        let offset_param = offset.to_string();
        let limit_param = self.page_size.to_string();

        let mut attempt = 0u32;
        loop {
            self.rate_limiter.acquire().await;

            debug!(query, offset, attempt = attempt + 1, "Requesting search page");

            let result = self
                .client
                .get(&self.base_url)
                .query(&[
                    ("query", query),
                    ("offset", offset_param.as_str()),
                    ("limit", limit_param.as_str()),
                ])
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    // Throttling comes back as 429 or as an HTML error page
                    if status == StatusCode::TOO_MANY_REQUESTS || !is_json_response(&response) {
                        debug!(query, offset, status = %status, "Rate limited by server");
                        return Ok(Page::RateLimited);
                    }

                    if status.is_success() {
                        return match response.json::<Vec<EmoteRecord>>().await {
                            Ok(records) => {
                                debug!(query, offset, records = records.len(), "Page received");
                                Ok(Page::Records(records))
                            }
                            Err(source) => Err(ApiError::Decode {
                                query: query.to_string(),
                                offset,
                                source,
                            }),
                        };
                    }

                    warn!(query, offset, status = %status, "Request failed");
                    if attempt >= self.max_retries {
                        return Err(ApiError::Status {
                            query: query.to_string(),
                            offset,
                            status,
                        });
                    }
                }
                Err(source) => {
                    warn!(query, offset, error = %source, "Request error");
                    if attempt >= self.max_retries {
                        return Err(ApiError::Transport {
                            query: query.to_string(),
                            offset,
                            source,
                        });
                    }
                }
            }

            let delay = Duration::from_millis(self.retry_delay_ms * 2u64.pow(attempt));
            debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
            sleep(delay).await;
            attempt += 1;
        }
    }
}

fn is_json_response(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false)
}
