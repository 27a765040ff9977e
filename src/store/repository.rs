//! Storage backend abstraction.
//!
//! A string key/value surface shaped like browser local storage
//! (get / set / remove, plus optional key enumeration). The secret store
//! layers its record and index keys on top.

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unavailable or access denied.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the write for lack of space.
    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded {
        /// Bytes the store would hold after the write.
        needed: usize,
        /// Configured capacity.
        limit: usize,
    },

    /// Filesystem error.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted or supplied data could not be encoded/decoded.
    #[error("malformed record {key}: {reason}")]
    Format {
        /// Storage key of the record.
        key: String,
        /// Decoder message.
        reason: String,
    },

    /// Market identifier is unusable as a key.
    #[error("invalid market id: {0:?}")]
    InvalidMarketId(String),

    /// Salt already backs a commitment for another market.
    #[error("salt already used for market {existing}")]
    SaltReused {
        /// Market that owns the salt.
        existing: String,
    },
}

impl StoreError {
    /// Whether the error means the storage itself failed (as opposed to bad
    /// input), i.e. a retry might succeed later.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::QuotaExceeded { .. } | StoreError::Io(_)
        )
    }
}

/// Key/value backend for bettor secrets.
pub trait SecretRepository: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Check whether a key is present.
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Keys beginning with `prefix`, sorted, or `None` if the backend cannot
    /// enumerate.
    fn keys_with_prefix(&self, _prefix: &str) -> Result<Option<Vec<String>>, StoreError> {
        Ok(None)
    }
}

impl<T: SecretRepository + ?Sized> SecretRepository for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        (**self).contains(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Option<Vec<String>>, StoreError> {
        (**self).keys_with_prefix(prefix)
    }
}
