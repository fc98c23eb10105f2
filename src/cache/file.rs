//! File-backed cache store
//!
//! Entries live next to the configured prefix as
//! `<file_path_prefix>_<key>.json`. Writes go to a temporary sibling file
//! that is renamed into place, so a reader never sees a half-written entry.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::error::{LooperError, Result};
use crate::results::ResultTensor;

/// Cache store writing one JSON file per sweep.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    prefix: PathBuf,
}

impl FileCacheStore {
    /// Create a store rooted at `prefix`, e.g. `data/v1.0/3.4a`.
    pub fn new<P: AsRef<Path>>(prefix: P) -> Self {
        Self {
            prefix: prefix.as_ref().to_path_buf(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// File holding the entry for `key`.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let mut name = self.prefix.as_os_str().to_os_string();
        name.push(format!("_{}.json", key));
        PathBuf::from(name)
    }

    fn read_entry(&self, key: &CacheKey) -> Result<Option<ResultTensor>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let entry: CacheEntry = serde_json::from_str(&contents)?;
        entry.into_tensor(key).map(Some)
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self, key: &CacheKey) -> Option<ResultTensor> {
        match self.read_entry(key) {
            Ok(tensor) => tensor,
            Err(e) => {
                warn!(
                    path = %self.entry_path(key).display(),
                    error = %e,
                    "Ignoring unusable cache entry"
                );
                None
            }
        }
    }

    fn store(&self, entry: CacheEntry) -> Result<()> {
        let path = self.entry_path(entry.key());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(&entry)?;
        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            LooperError::Cache(format!(
                "Failed to move cache entry into place at {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "Stored cache entry");
        Ok(())
    }

    fn invalidate(&self, key: &CacheKey) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
