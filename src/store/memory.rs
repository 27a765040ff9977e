//! In-memory repository.
//!
//! Deterministic backend for tests and ephemeral sessions. An optional byte
//! quota mimics the capacity limit of browser storage.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::repository::{SecretRepository, StoreError};

/// Map-backed repository.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    entries: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl InMemoryRepository {
    /// Unbounded repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository that rejects writes once keys plus values exceed `limit`
    /// bytes.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota_bytes: Some(limit),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.entries
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl SecretRepository for InMemoryRepository {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.write()?;

        if let Some(limit) = self.quota_bytes {
            let current: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = current + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded { needed, limit });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.write()?.remove(key);
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.contains_key(key))
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Option<Vec<String>>, StoreError> {
        let keys = self
            .read()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        Ok(Some(keys))
    }
}
