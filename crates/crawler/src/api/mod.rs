//! Shared-emote search API client.
//!
//! This module provides a rate-limited, retry-enabled client for the
//! emote search endpoint, plus the trait seam the fetcher is tested against.

pub mod client;
pub mod rate_limiter;
pub mod types;

pub use client::{ApiError, Page, SearchApi, SearchClient};
pub use rate_limiter::RateLimiter;
pub use types::EmoteRecord;
