//! Backup / Restore
//!
//! Secrets exist only on the bettor's device, so losing them forfeits the
//! ability to reveal. Export writes every stored secret to a JSON object keyed
//! by market id; import writes them back.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::commit::secret::{CommitSecret, MarketId};
use crate::core::clock::to_iso8601;
use crate::store::{SecretRepository, SecretStore, StoreError};

/// Backup errors.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Blob is not a JSON object of market id → record.
    #[error("malformed backup: {0}")]
    Format(#[from] serde_json::Error),

    /// Storage failed while reading secrets for export.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// A single entry that could not be imported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    /// Market id of the entry.
    pub market_id: MarketId,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of an import.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Entries written.
    pub imported: usize,
    /// Entries skipped.
    pub failed: Vec<ImportFailure>,
}

/// Per-market reveal sheet for the bettor to keep offline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealSheet {
    /// Market id.
    pub market_id: MarketId,
    /// Market title, when the caller knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_title: Option<String>,
    /// `yes` / `no`.
    pub outcome: String,
    /// Stake in whole tokens.
    pub amount: String,
    /// 0x-hex salt.
    pub salt: String,
    /// 0x-hex commitment.
    pub commit_hash: String,
    /// Commit time, ISO-8601.
    pub timestamp: String,
}

/// Serialize every stored secret as pretty JSON `{market_id: record}`.
///
/// Markets listed as unrevealed but without a readable secret are left out.
pub fn export_all<R: SecretRepository>(store: &SecretStore<R>) -> Result<String, BackupError> {
    let mut secrets: BTreeMap<MarketId, CommitSecret> = BTreeMap::new();

    for market_id in store.list_unrevealed()? {
        if let Some(secret) = store.retrieve(&market_id)? {
            secrets.insert(market_id, secret);
        }
    }

    info!(count = secrets.len(), "Exported commit secrets");
    Ok(serde_json::to_string_pretty(&secrets)?)
}

/// Restore secrets from an [`export_all`] blob, overwriting existing entries.
///
/// A blob that is not a JSON object fails before any write. Individual
/// entries are independent: a bad record or a failed write is reported in
/// [`ImportSummary::failed`] and the rest still import.
pub fn import_all<R: SecretRepository>(
    store: &SecretStore<R>,
    blob: &str,
) -> Result<ImportSummary, BackupError> {
    let entries: BTreeMap<MarketId, serde_json::Value> = serde_json::from_str(blob)?;
    let mut summary = ImportSummary::default();

    for (market_id, value) in entries {
        let result = serde_json::from_value::<CommitSecret>(value)
            .map_err(|e| e.to_string())
            .and_then(|secret| store.store(&market_id, &secret).map_err(|e| e.to_string()));

        match result {
            Ok(()) => summary.imported += 1,
            Err(reason) => {
                warn!(%market_id, "Skipping backup entry: {}", reason);
                summary.failed.push(ImportFailure { market_id, reason });
            }
        }
    }

    info!(
        imported = summary.imported,
        failed = summary.failed.len(),
        "Imported commit secrets"
    );
    Ok(summary)
}

/// Build the reveal sheet for one market, or `None` if no secret is stored.
pub fn reveal_sheet<R: SecretRepository>(
    store: &SecretStore<R>,
    market_id: &str,
    market_title: Option<&str>,
) -> Result<Option<RevealSheet>, StoreError> {
    let Some(secret) = store.retrieve(market_id)? else {
        return Ok(None);
    };

    Ok(Some(RevealSheet {
        market_id: market_id.to_string(),
        market_title: market_title.map(str::to_string),
        outcome: secret.outcome.to_string(),
        amount: secret.amount.format_token(),
        salt: secret.salt.to_string(),
        commit_hash: secret.commit_hash.to_string(),
        timestamp: to_iso8601(secret.timestamp).unwrap_or_else(|| secret.timestamp.to_string()),
    }))
}

/// [`reveal_sheet`] rendered as pretty JSON.
pub fn export_reveal_data<R: SecretRepository>(
    store: &SecretStore<R>,
    market_id: &str,
    market_title: Option<&str>,
) -> Result<Option<String>, BackupError> {
    match reveal_sheet(store, market_id, market_title)? {
        Some(sheet) => Ok(Some(serde_json::to_string_pretty(&sheet)?)),
        None => Ok(None),
    }
}

/// Parse a backup blob without writing anything.
pub fn parse_backup(blob: &str) -> Result<BTreeMap<MarketId, CommitSecret>, BackupError> {
    Ok(serde_json::from_str(blob)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::commitment::{generate_commit, Outcome};
    use crate::core::address::Address;
    use crate::core::amount::Amount;
    use crate::store::InMemoryRepository;

    fn bettor() -> Address {
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
    }

    fn make_secret(outcome: Outcome, amount: u128) -> CommitSecret {
        let commit = generate_commit(outcome, &bettor());
        CommitSecret::new(&commit, outcome, Amount::from_minor(amount), 1_700_000_000_000)
    }

    fn populated() -> SecretStore<InMemoryRepository> {
        let store = SecretStore::new(InMemoryRepository::new());
        store.store("1", &make_secret(Outcome::Yes, 100)).unwrap();
        store.store("2", &make_secret(Outcome::No, 200)).unwrap();
        store.store("3", &make_secret(Outcome::Yes, 300)).unwrap();
        store
    }

    #[test]
    fn test_export_import_round_trip() {
        let source = populated();
        let blob = export_all(&source).unwrap();

        let target = SecretStore::new(InMemoryRepository::new());
        let summary = import_all(&target, &blob).unwrap();
        assert_eq!(summary.imported, 3);
        assert!(summary.failed.is_empty());

        let mut ids = target.list_unrevealed().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3"]);
        for id in ids {
            assert_eq!(target.retrieve(&id).unwrap(), source.retrieve(&id).unwrap());
        }

        assert_eq!(parse_backup(&export_all(&target).unwrap()).unwrap(), parse_backup(&blob).unwrap());
    }

    #[test]
    fn test_export_skips_missing_secrets() {
        let store = populated();
        store
            .repository()
            .set(&SecretStore::<InMemoryRepository>::secret_key("2"), "garbage")
            .unwrap();

        let exported = parse_backup(&export_all(&store).unwrap()).unwrap();
        assert_eq!(exported.keys().collect::<Vec<_>>(), vec!["1", "3"]);
        assert!(!export_all(&store).unwrap().contains("null"));
    }

    #[test]
    fn test_export_empty_store() {
        let store = SecretStore::new(InMemoryRepository::new());
        assert_eq!(export_all(&store).unwrap(), "{}");
    }

    #[test]
    fn test_import_overwrites_existing() {
        let source = populated();
        let blob = export_all(&source).unwrap();

        let target = SecretStore::new(InMemoryRepository::new());
        target.store("1", &make_secret(Outcome::No, 999)).unwrap();
        import_all(&target, &blob).unwrap();

        assert_eq!(target.retrieve("1").unwrap(), source.retrieve("1").unwrap());
    }

    #[test]
    fn test_malformed_blob_imports_nothing() {
        let store = SecretStore::new(InMemoryRepository::new());

        for blob in ["not json", "[1,2,3]", "\"text\"", "{\"1\": "] {
            assert!(matches!(import_all(&store, blob), Err(BackupError::Format(_))));
        }
        assert!(store.list_unrevealed().unwrap().is_empty());
        assert!(store.repository().is_empty());
    }

    #[test]
    fn test_partial_import() {
        let good = make_secret(Outcome::Yes, 1);
        let blob = serde_json::json!({
            "ok": good,
            "bad": {"commitHash": "0x12", "salt": "0x34", "outcome": "maybe"},
        })
        .to_string();

        let store = SecretStore::new(InMemoryRepository::new());
        let summary = import_all(&store, &blob).unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].market_id, "bad");
        assert_eq!(store.retrieve("ok").unwrap(), Some(good));
    }

    #[test]
    fn test_reveal_sheet() {
        let store = SecretStore::new(InMemoryRepository::new());
        let secret = make_secret(Outcome::Yes, 1_500_000_000_000_000_000);
        store.store("42", &secret).unwrap();

        let sheet = reveal_sheet(&store, "42", Some("Will it rain?")).unwrap().unwrap();
        assert_eq!(sheet.outcome, "yes");
        assert_eq!(sheet.amount, "1.5");
        assert_eq!(sheet.salt, secret.salt.to_string());
        assert_eq!(sheet.commit_hash, secret.commit_hash.to_string());
        assert_eq!(sheet.timestamp, "2023-11-14T22:13:20.000Z");

        let json = export_reveal_data(&store, "42", None).unwrap().unwrap();
        assert!(json.contains("\"marketId\": \"42\""));
        assert!(!json.contains("marketTitle"));

        assert_eq!(export_reveal_data(&store, "missing", None).unwrap(), None);
    }
}
