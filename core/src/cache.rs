//! Loaded-table cache for callers that re-query the same extracts.
//!
//! Entries are keyed by canonical path and validated against the file's
//! modification time on every lookup; a changed mtime reloads the table.
//! The engine never touches this cache.

use crate::{
    error::{PeerError, PeerResult},
    loader,
    table::{HeadcountTable, MetricTable},
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::SystemTime,
};

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub modified:  SystemTime,
    pub loaded_at: DateTime<Utc>,
    pub table:     T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits:   u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct TableCache {
    metrics:    HashMap<(PathBuf, String), CacheEntry<MetricTable>>,
    headcounts: HashMap<PathBuf, CacheEntry<HeadcountTable>>,
    stats:      CacheStats,
}

fn file_state(path: &Path) -> PeerResult<(PathBuf, SystemTime)> {
    let to_load_err = |e: std::io::Error| PeerError::DataLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    let canonical = path.canonicalize().map_err(to_load_err)?;
    let modified = std::fs::metadata(&canonical)
        .and_then(|m| m.modified())
        .map_err(to_load_err)?;
    Ok((canonical, modified))
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.metrics.len() + self.headcounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.metrics.clear();
        self.headcounts.clear();
    }

    pub fn metric_table(&mut self, path: &Path, metric_column: &str) -> PeerResult<&MetricTable> {
        let (canonical, modified) = file_state(path)?;
        let key = (canonical, metric_column.to_string());

        let fresh = self
            .metrics
            .get(&key)
            .is_some_and(|entry| entry.modified == modified);
        if fresh {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let table = loader::load_metric_csv(&key.0, metric_column)?;
            log::debug!("cache: (re)loaded {}", key.0.display());
            self.metrics.insert(
                key.clone(),
                CacheEntry {
                    modified,
                    loaded_at: Utc::now(),
                    table,
                },
            );
        }
        self.metrics
            .get(&key)
            .map(|entry| &entry.table)
            .ok_or_else(|| anyhow::anyhow!("cache entry vanished for {}", key.0.display()).into())
    }

    pub fn headcount_table(&mut self, path: &Path) -> PeerResult<&HeadcountTable> {
        let (canonical, modified) = file_state(path)?;

        let fresh = self
            .headcounts
            .get(&canonical)
            .is_some_and(|entry| entry.modified == modified);
        if fresh {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let table = loader::load_headcount_csv(&canonical)?;
            log::debug!("cache: (re)loaded {}", canonical.display());
            self.headcounts.insert(
                canonical.clone(),
                CacheEntry {
                    modified,
                    loaded_at: Utc::now(),
                    table,
                },
            );
        }
        self.headcounts
            .get(&canonical)
            .map(|entry| &entry.table)
            .ok_or_else(|| anyhow::anyhow!("cache entry vanished for {}", canonical.display()).into())
    }

    /// When the cached copy of `path` was loaded, if cached.
    pub fn loaded_at(&self, path: &Path) -> Option<DateTime<Utc>> {
        let canonical = path.canonicalize().ok()?;
        self.headcounts
            .get(&canonical)
            .map(|e| e.loaded_at)
            .or_else(|| {
                self.metrics
                    .iter()
                    .find(|((p, _), _)| *p == canonical)
                    .map(|(_, e)| e.loaded_at)
            })
    }
}
