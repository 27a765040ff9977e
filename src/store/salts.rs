//! Used-salt ledger.
//!
//! Remembers a fingerprint of every salt that has backed a commitment so the
//! same salt is never committed for two markets. Fingerprints outlive the
//! secrets they came from: clearing a revealed market does not free its salt.

use std::collections::BTreeMap;

use tracing::warn;

use super::repository::{SecretRepository, StoreError};
use crate::core::rng::Salt;

/// Storage key of the ledger record.
pub const SALT_LEDGER_KEY: &str = "darkbet_used_salts";

/// Fingerprint (hex) → owning market id.
type Ledger = BTreeMap<String, String>;

fn load<R: SecretRepository + ?Sized>(repo: &R) -> Result<Ledger, StoreError> {
    let Some(raw) = repo.get(SALT_LEDGER_KEY)? else {
        return Ok(Ledger::new());
    };
    match serde_json::from_str(&raw) {
        Ok(ledger) => Ok(ledger),
        Err(e) => {
            warn!("Salt ledger is malformed, starting a new one: {}", e);
            Ok(Ledger::new())
        }
    }
}

/// Market that already owns `salt`, if any.
pub fn owner_of<R: SecretRepository + ?Sized>(
    repo: &R,
    salt: &Salt,
) -> Result<Option<String>, StoreError> {
    let key = hex::encode(salt.fingerprint());
    Ok(load(repo)?.remove(&key))
}

/// Record `salt` as used by `market_id`.
pub fn record<R: SecretRepository + ?Sized>(
    repo: &R,
    salt: &Salt,
    market_id: &str,
) -> Result<(), StoreError> {
    let mut ledger = load(repo)?;
    let key = hex::encode(salt.fingerprint());
    if ledger.get(&key).map(String::as_str) == Some(market_id) {
        return Ok(());
    }
    ledger.insert(key, market_id.to_string());

    let encoded = serde_json::to_string(&ledger).map_err(|e| StoreError::Format {
        key: SALT_LEDGER_KEY.into(),
        reason: e.to_string(),
    })?;
    repo.set(SALT_LEDGER_KEY, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryRepository;

    #[test]
    fn test_record_and_lookup() {
        let repo = InMemoryRepository::new();
        let salt = Salt::from_bytes([3; 32]);

        assert_eq!(owner_of(&repo, &salt).unwrap(), None);
        record(&repo, &salt, "42").unwrap();
        assert_eq!(owner_of(&repo, &salt).unwrap().as_deref(), Some("42"));
        assert_eq!(owner_of(&repo, &Salt::from_bytes([4; 32])).unwrap(), None);
    }

    #[test]
    fn test_ledger_does_not_store_raw_salt() {
        let repo = InMemoryRepository::new();
        let salt = Salt::from_bytes([0x5a; 32]);
        record(&repo, &salt, "7").unwrap();

        let raw = repo.get(SALT_LEDGER_KEY).unwrap().unwrap();
        assert!(!raw.contains(&hex::encode(salt.as_bytes())));
    }

    #[test]
    fn test_malformed_ledger_recovers() {
        let repo = InMemoryRepository::new();
        repo.set(SALT_LEDGER_KEY, "not json").unwrap();

        let salt = Salt::from_bytes([1; 32]);
        assert_eq!(owner_of(&repo, &salt).unwrap(), None);
        record(&repo, &salt, "1").unwrap();
        assert_eq!(owner_of(&repo, &salt).unwrap().as_deref(), Some("1"));
    }
}
