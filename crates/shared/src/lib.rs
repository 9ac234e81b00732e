//! Shared library for the emote crawl-and-merge pipeline.
//!
//! This crate provides common functionality used across all binary crates:
//! - Configuration management
//! - Core data model (shards and the merged catalog)
//! - Shard file storage
//! - File path utilities
//! - Logging infrastructure

pub mod config;
pub mod logging;
pub mod models;
pub mod paths;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::{emote_image_url, Catalog, ImageScale, SearchMatch, Shard};
pub use paths::DataPaths;
pub use store::{ShardStore, StoreError};

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
