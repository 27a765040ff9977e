//! Secret Store
//!
//! Persists one [`CommitSecret`] per market plus the Unrevealed-Market
//! Registry listing which markets currently hold one.
//!
//! Key layout on the repository:
//! - `darkbet_commit_{market_id}` → secret record (JSON)
//! - `darkbet_unrevealed_list`    → registry (JSON array, insertion order)
//! - `darkbet_used_salts`         → salt ledger (see [`super::salts`])
//!
//! The secret record is authoritative. The registry is an index over it: a
//! failed registry write never fails a store, and readers repair drift by
//! enumerating secret keys when the backend supports it.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::repository::{SecretRepository, StoreError};
use super::salts;
use crate::commit::secret::{CommitSecret, MarketId};

/// Key prefix of per-market secret records.
pub const SECRET_KEY_PREFIX: &str = "darkbet_commit_";

/// Key of the Unrevealed-Market Registry.
pub const REGISTRY_KEY: &str = "darkbet_unrevealed_list";

/// Result of a registry repair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Markets with a secret that were missing from the registry.
    pub added: Vec<MarketId>,
    /// Registry entries with no secret behind them.
    pub removed: Vec<MarketId>,
}

impl ReconcileReport {
    /// Whether the registry was already consistent.
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Market-keyed secret persistence over a [`SecretRepository`].
#[derive(Debug)]
pub struct SecretStore<R> {
    repo: R,
}

impl<R: SecretRepository> SecretStore<R> {
    /// Wrap a repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Storage key of a market's secret.
    pub fn secret_key(market_id: &str) -> String {
        format!("{}{}", SECRET_KEY_PREFIX, market_id)
    }

    /// Persist `secret` for `market_id`, overwriting any previous one, and
    /// register the market as unrevealed.
    ///
    /// Rejects a salt that already backs a different market.
    pub fn store(&self, market_id: &str, secret: &CommitSecret) -> Result<(), StoreError> {
        validate_market_id(market_id)?;

        if let Some(existing) = salts::owner_of(&self.repo, &secret.salt)? {
            if existing != market_id {
                return Err(StoreError::SaltReused { existing });
            }
        }

        let key = Self::secret_key(market_id);
        let encoded = serde_json::to_string(secret).map_err(|e| StoreError::Format {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.repo.set(&key, &encoded)?;
        debug!(market_id, commit_hash = %secret.commit_hash, "Stored commit secret");

        // The secret is durable at this point; index writes only warn.
        if let Err(e) = self.add_to_registry(market_id) {
            warn!(market_id, "Failed to register unrevealed market: {}", e);
        }
        if let Err(e) = salts::record(&self.repo, &secret.salt, market_id) {
            warn!(market_id, "Failed to record salt fingerprint: {}", e);
        }

        Ok(())
    }

    /// Load the secret for `market_id`.
    ///
    /// `Ok(None)` when nothing is stored, and also when the stored record is
    /// malformed (logged): an unreadable secret cannot be revealed anyway.
    pub fn retrieve(&self, market_id: &str) -> Result<Option<CommitSecret>, StoreError> {
        let key = Self::secret_key(market_id);
        let Some(raw) = self.repo.get(&key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(secret) => Ok(Some(secret)),
            Err(e) => {
                warn!(market_id, "Discarding malformed commit secret: {}", e);
                Ok(None)
            }
        }
    }

    /// Check whether a readable secret exists for `market_id`.
    pub fn has_unrevealed(&self, market_id: &str) -> Result<bool, StoreError> {
        Ok(self.retrieve(market_id)?.is_some())
    }

    /// Delete the secret for `market_id` and drop it from the registry.
    /// Clearing an absent market is a no-op.
    pub fn clear(&self, market_id: &str) -> Result<(), StoreError> {
        self.repo.remove(&Self::secret_key(market_id))?;

        if let Err(e) = self.remove_from_registry(market_id) {
            warn!(market_id, "Failed to unregister market: {}", e);
        }
        debug!(market_id, "Cleared commit secret");
        Ok(())
    }

    /// Markets that currently hold a secret, in registration order.
    ///
    /// Registry entries without a secret are skipped; secrets missing from the
    /// registry are appended when the backend can enumerate keys.
    pub fn list_unrevealed(&self) -> Result<Vec<MarketId>, StoreError> {
        let registry = self.read_registry()?;
        let stored = self.stored_market_ids()?;

        let mut seen = BTreeSet::new();
        let mut ids = Vec::with_capacity(registry.len());
        for id in registry {
            if !seen.insert(id.clone()) {
                continue;
            }
            let present = match &stored {
                Some(stored) => stored.contains(&id),
                None => self.repo.contains(&Self::secret_key(&id))?,
            };
            if present {
                ids.push(id);
            }
        }

        if let Some(stored) = stored {
            for id in stored {
                if !seen.contains(&id) {
                    ids.push(id);
                }
            }
        }

        Ok(ids)
    }

    /// Rewrite the registry so it matches the stored secrets.
    pub fn reconcile(&self) -> Result<ReconcileReport, StoreError> {
        let registry = self.read_registry()?;
        let listed = self.list_unrevealed()?;

        let report = ReconcileReport {
            added: listed.iter().filter(|id| !registry.contains(id)).cloned().collect(),
            removed: registry.iter().filter(|id| !listed.contains(id)).cloned().collect(),
        };

        if !report.is_clean() || registry.len() != listed.len() {
            self.write_registry(&listed)?;
            info!(
                added = report.added.len(),
                removed = report.removed.len(),
                "Reconciled unrevealed-market registry"
            );
        }

        Ok(report)
    }

    fn stored_market_ids(&self) -> Result<Option<BTreeSet<MarketId>>, StoreError> {
        Ok(self.repo.keys_with_prefix(SECRET_KEY_PREFIX)?.map(|keys| {
            keys.into_iter()
                .filter_map(|k| k.strip_prefix(SECRET_KEY_PREFIX).map(str::to_string))
                .filter(|id| !id.is_empty())
                .collect()
        }))
    }

    fn read_registry(&self) -> Result<Vec<MarketId>, StoreError> {
        let Some(raw) = self.repo.get(REGISTRY_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(ids) => Ok(ids),
            Err(e) => {
                warn!("Unrevealed-market registry is malformed, ignoring it: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn write_registry(&self, ids: &[MarketId]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(ids).map_err(|e| StoreError::Format {
            key: REGISTRY_KEY.into(),
            reason: e.to_string(),
        })?;
        self.repo.set(REGISTRY_KEY, &encoded)
    }

    fn add_to_registry(&self, market_id: &str) -> Result<(), StoreError> {
        let mut ids = self.read_registry()?;
        if ids.iter().any(|id| id == market_id) {
            return Ok(());
        }
        ids.push(market_id.to_string());
        self.write_registry(&ids)
    }

    fn remove_from_registry(&self, market_id: &str) -> Result<(), StoreError> {
        let mut ids = self.read_registry()?;
        let before = ids.len();
        ids.retain(|id| id != market_id);
        if ids.len() == before {
            return Ok(());
        }
        self.write_registry(&ids)
    }
}

fn validate_market_id(market_id: &str) -> Result<(), StoreError> {
    if market_id.trim().is_empty() || market_id.chars().any(char::is_control) {
        return Err(StoreError::InvalidMarketId(market_id.to_string()));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
