//! File path utilities for the data directory layout.
//!
//! One shard file per query key under `shards/`, the merged catalog and the
//! crawl report at the data root, logs under `logs/`.

use std::path::{Path, PathBuf};

/// File path manager for data files
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Create a new DataPaths with the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the shard directory
    pub fn shards_dir(&self) -> PathBuf {
        self.root.join("shards")
    }

    /// Get the shard file path for a query key
    pub fn shard_file(&self, key: &str) -> PathBuf {
        self.shards_dir().join(format!("_{}.json", key))
    }

    /// Get the merged catalog file path
    pub fn catalog_file(&self) -> PathBuf {
        self.root.join("catalog.json")
    }

    /// Get the crawl report file path
    pub fn crawl_report_file(&self) -> PathBuf {
        self.root.join("crawl_report.json")
    }

    /// Get the logs directory
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Create all necessary directories
    pub fn create_dirs(&self) -> std::io::Result<()> {
        for dir in [self.shards_dir(), self.logs_dir()] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let paths = DataPaths::new("/data");

        assert_eq!(
            paths.shard_file("abc"),
            PathBuf::from("/data/shards/_abc.json")
        );

        assert_eq!(paths.catalog_file(), PathBuf::from("/data/catalog.json"));

        assert_eq!(paths.logs_dir(), PathBuf::from("/data/logs"));
    }

    #[test]
    fn test_shard_file_keeps_key_verbatim() {
        let paths = DataPaths::new("/data");

        // Apostrophe is part of the query alphabet and legal in filenames
        assert_eq!(
            paths.shard_file("a'b"),
            PathBuf::from("/data/shards/_a'b.json")
        );
    }
}
