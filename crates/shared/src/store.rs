//! Persistent storage for per-key shard files.
//!
//! One JSON file per query key, named `_<key>.json`. Saves go through a
//! temp-file-then-rename so a concurrent existence check or load never
//! observes a partially written shard.

use crate::models::Shard;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from shard storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corrupt shard file {path}: {source}")]
    CorruptShard {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize shard for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Store for persisted shards
#[derive(Debug, Clone)]
pub struct ShardStore {
    /// Directory holding the shard files
    shard_dir: PathBuf,
}

impl ShardStore {
    /// Create a new store rooted at `shard_dir`, creating the directory
    pub fn new(shard_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let shard_dir = shard_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&shard_dir)?;
        Ok(Self { shard_dir })
    }

    /// Check whether a shard for `key` has been persisted
    pub fn exists(&self, key: &str) -> bool {
        self.shard_path(key).exists()
    }

    /// Persist a shard for `key`, atomically
    pub fn save(&self, key: &str, shard: &Shard) -> Result<(), StoreError> {
        let path = self.shard_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let content = serde_json::to_string(shard).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;

        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &path)?;

        debug!(key = key, path = %path.display(), "Shard persisted");
        Ok(())
    }

    /// Load a previously saved shard
    pub fn load(&self, key: &str) -> Result<Shard, StoreError> {
        let path = self.shard_path(key);
        let content = std::fs::read_to_string(&path)?;

        serde_json::from_str(&content).map_err(|source| StoreError::CorruptShard { path, source })
    }

    /// List all persisted shard keys, sorted lexicographically.
    ///
    /// The sorted order is what makes merge output reproducible.
    pub fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();

        for entry in std::fs::read_dir(&self.shard_dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(key) = name
                .strip_prefix('_')
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                keys.push(key.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Get the shard file path for a given key
    pub fn shard_path(&self, key: &str) -> PathBuf {
        self.shard_dir.join(format!("_{}.json", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_shard() -> Shard {
        let mut shard = Shard::new();
        shard.push("Kappa", "56e9f494fff3cc5c35e5287e".to_string());
        shard.push("Kappa", "5590b223b344e2c42a9e28e3".to_string());
        shard.push("monkaS", "5714c2dfcc4a8b31f8b68a4e".to_string());
        shard
    }

    #[test]
    fn test_save_and_load_round_trip() -> Result<(), StoreError> {
        let temp_dir = TempDir::new().unwrap();
        let store = ShardStore::new(temp_dir.path())?;

        let shard = sample_shard();
        assert!(!store.exists("abc"));

        store.save("abc", &shard)?;
        assert!(store.exists("abc"));

        let loaded = store.load("abc")?;
        assert_eq!(loaded, shard);

        Ok(())
    }

    #[test]
    fn test_save_leaves_no_temp_file() -> Result<(), StoreError> {
        let temp_dir = TempDir::new().unwrap();
        let store = ShardStore::new(temp_dir.path())?;

        store.save("abc", &sample_shard())?;

        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        Ok(())
    }

    #[test]
    fn test_load_corrupt_shard() -> Result<(), StoreError> {
        let temp_dir = TempDir::new().unwrap();
        let store = ShardStore::new(temp_dir.path())?;

        std::fs::write(store.shard_path("bad"), "definitely not json").unwrap();

        match store.load("bad") {
            Err(StoreError::CorruptShard { path, .. }) => {
                assert_eq!(path, store.shard_path("bad"));
            }
            other => panic!("expected CorruptShard, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_list_keys_sorted() -> Result<(), StoreError> {
        let temp_dir = TempDir::new().unwrap();
        let store = ShardStore::new(temp_dir.path())?;

        for key in ["zzz", "aaa", "mn0"] {
            store.save(key, &sample_shard())?;
        }

        // A stray non-shard file is ignored
        std::fs::write(temp_dir.path().join("README.txt"), "ignore me").unwrap();

        assert_eq!(store.list_keys()?, vec!["aaa", "mn0", "zzz"]);

        Ok(())
    }
}
