//! Shard merging.
//!
//! Folds every persisted shard into one catalog, processing keys in sorted
//! order so repeated merges over the same shard set produce byte-identical
//! output. Shards are loaded one at a time in fixed-size batches, which
//! bounds peak memory and gives the progress reporting its granularity.

use anyhow::{Context, Result};
use shared::{Catalog, ShardStore, StoreError};
use std::path::Path;
use tracing::{error, info, warn};

/// Statistics for one merge run
#[derive(Debug, Clone, Default)]
pub struct MergeStats {
    pub shards_total: usize,
    pub shards_merged: usize,
    pub shards_corrupt: usize,
    pub codes: usize,
    pub ids: usize,
}

/// Merges all persisted shards into a catalog
pub struct Merger {
    store: ShardStore,
    /// Number of batches the shard set is split into
    batch_count: usize,
}

impl Merger {
    pub fn new(store: ShardStore, batch_count: usize) -> Self {
        Self {
            store,
            batch_count: batch_count.max(1),
        }
    }

    /// Fold every shard into one catalog.
    ///
    /// A shard that fails to parse is skipped and counted; it never aborts
    /// the merge. I/O failures on the shard directory itself do abort.
    pub fn merge_all(&self) -> Result<(Catalog, MergeStats)> {
        let keys = self.store.list_keys().context("Failed to list shards")?;
        let total = keys.len();

        let mut stats = MergeStats {
            shards_total: total,
            ..Default::default()
        };
        let mut catalog = Catalog::new();

        if total == 0 {
            warn!("No shards found, catalog will be empty");
            return Ok((catalog, stats));
        }

        info!(shards = total, "Merging shards");

        let batch_size = (total / self.batch_count).max(1);
        let mut processed = 0usize;

        for batch in keys.chunks(batch_size) {
            for key in batch {
                match self.store.load(key) {
                    Ok(shard) => {
                        catalog.absorb(shard);
                        stats.shards_merged += 1;
                    }
                    Err(StoreError::CorruptShard { path, source }) => {
                        error!(
                            key = %key,
                            path = %path.display(),
                            error = %source,
                            "Skipping corrupt shard"
                        );
                        stats.shards_corrupt += 1;
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("Failed to read shard {:?}", key));
                    }
                }
            }

            processed += batch.len();
            info!(
                processed,
                total,
                progress = format!("{:.2}%", processed as f64 / total as f64 * 100.0),
                "Merge progress"
            );
        }

        stats.codes = catalog.code_count();
        stats.ids = catalog.id_count();

        info!(
            merged = stats.shards_merged,
            corrupt = stats.shards_corrupt,
            codes = stats.codes,
            ids = stats.ids,
            "Merge complete"
        );

        Ok((catalog, stats))
    }

    /// Write the catalog as one whole-file JSON blob
    pub fn write_catalog(&self, catalog: &Catalog, path: &Path) -> Result<()> {
        let content = serde_json::to_string(catalog).context("Failed to serialize catalog")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write catalog: {}", path.display()))?;
        info!(path = %path.display(), codes = catalog.code_count(), "Catalog written");
        Ok(())
    }
}
