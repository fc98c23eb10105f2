//! In-memory cache store, used when no file prefix is configured.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::error::{LooperError, Result};
use crate::results::ResultTensor;

/// Cache store keeping entries for the lifetime of the store.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|_| LooperError::Cache("In-memory cache lock poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self, key: &CacheKey) -> Option<ResultTensor> {
        let entry = match self.entries() {
            Ok(entries) => entries.get(key).cloned()?,
            Err(e) => {
                warn!(error = %e, "In-memory cache unavailable");
                return None;
            }
        };

        match entry.into_tensor(key) {
            Ok(tensor) => Some(tensor),
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring unusable cache entry");
                None
            }
        }
    }

    fn store(&self, entry: CacheEntry) -> Result<()> {
        self.entries()?.insert(entry.key().clone(), entry);
        Ok(())
    }

    fn invalidate(&self, key: &CacheKey) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}
