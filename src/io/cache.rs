//! Memoized dataset loading.
//!
//! Entries are keyed by `(canonical path, load options)` and carry a
//! fingerprint of the file (`length`, `modified`). A lookup whose fingerprint
//! no longer matches reloads the file and replaces the entry. Callers share
//! the cached data through `Arc`; nothing in the cache is ever mutated in
//! place.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::domain::LoadOptions;
use crate::error::PipelineError;
use crate::io::ingest::{IngestedData, load_dataset};

/// Cheap identity of a source file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceFingerprint {
    pub fn of(path: &Path) -> Result<Self, PipelineError> {
        let meta = fs::metadata(path).map_err(|e| PipelineError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug)]
struct CacheEntry {
    fingerprint: SourceFingerprint,
    data: Arc<IngestedData>,
}

/// Explicit memoization table for loaded datasets.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<(PathBuf, LoadOptions), CacheEntry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading it if absent or stale.
    pub fn get_or_load(&mut self, path: &Path, options: LoadOptions) -> Result<Arc<IngestedData>, PipelineError> {
        let key = (canonical(path)?, options);
        let fingerprint = SourceFingerprint::of(&key.0)?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.fingerprint == fingerprint {
                log::debug!("dataset cache hit for '{}'", key.0.display());
                return Ok(Arc::clone(&entry.data));
            }
            log::debug!("dataset cache entry for '{}' is stale; reloading", key.0.display());
        } else {
            log::debug!("dataset cache miss for '{}'", key.0.display());
        }

        let data = Arc::new(load_dataset(&key.0, options)?);
        self.entries.insert(
            key,
            CacheEntry {
                fingerprint,
                data: Arc::clone(&data),
            },
        );
        Ok(data)
    }

    /// Drop every entry for `path` (all load options). Returns whether anything was removed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let target = canonical(path).unwrap_or_else(|_| path.to_path_buf());
        let before = self.entries.len();
        self.entries.retain(|(p, _), _| *p != target);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn canonical(path: &Path) -> Result<PathBuf, PipelineError> {
    fs::canonicalize(path).map_err(|e| PipelineError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
