//! Expired commitment cleanup.
//!
//! Market expirations come from the backend/chain on every call; nothing here
//! caches them.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::commit::secret::{CommitSecret, MarketId};
use crate::commit::window::{RevealStatus, RevealWindow};
use crate::core::clock::{Clock, TimestampMs};
use crate::store::{SecretRepository, SecretStore, StoreError};

/// Expiration of a market as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketExpiry {
    /// Market id.
    #[serde(alias = "id")]
    pub market_id: MarketId,
    /// Expiration (epoch ms).
    #[serde(alias = "expiresAt")]
    pub expiration: TimestampMs,
}

impl MarketExpiry {
    /// Convenience constructor.
    pub fn new(market_id: impl Into<MarketId>, expiration: TimestampMs) -> Self {
        Self {
            market_id: market_id.into(),
            expiration,
        }
    }
}

/// Result of a sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Markets whose secrets were discarded.
    pub cleared: Vec<MarketId>,
    /// Unrevealed markets whose window is still open.
    pub retained: Vec<MarketId>,
    /// Unrevealed markets absent from the supplied list.
    pub unknown: Vec<MarketId>,
}

/// An unrevealed commitment with its window state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingReveal {
    /// Market id.
    pub market_id: MarketId,
    /// Stored opening.
    pub secret: CommitSecret,
    /// Reveal deadline, when the market's expiration is known.
    pub deadline: Option<TimestampMs>,
    /// Window state, when the market's expiration is known.
    pub status: Option<RevealStatus>,
}

/// Discard secrets whose reveal window has closed.
///
/// Only markets that are both unrevealed and present in `markets` are
/// considered. Each discarded secret is logged at warn level: the bet behind
/// it can no longer be revealed and falls to the market's refund/forfeit
/// rules.
pub fn sweep_expired<R: SecretRepository, C: Clock>(
    store: &SecretStore<R>,
    window: &RevealWindow<C>,
    markets: &[MarketExpiry],
) -> Result<SweepReport, StoreError> {
    let mut report = SweepReport::default();

    for market_id in store.list_unrevealed()? {
        let Some(market) = markets.iter().find(|m| m.market_id == market_id) else {
            report.unknown.push(market_id);
            continue;
        };

        if window.is_expired(market.expiration) {
            store.clear(&market_id)?;
            warn!(
                %market_id,
                deadline = window.deadline(market.expiration),
                "Reveal window closed, discarded unrevealed commitment"
            );
            report.cleared.push(market_id);
        } else {
            report.retained.push(market_id);
        }
    }

    debug!(
        cleared = report.cleared.len(),
        retained = report.retained.len(),
        unknown = report.unknown.len(),
        "Sweep complete"
    );
    Ok(report)
}

/// Every unrevealed commitment with its deadline, for prompting reveals.
pub fn pending_reveals<R: SecretRepository, C: Clock>(
    store: &SecretStore<R>,
    window: &RevealWindow<C>,
    markets: &[MarketExpiry],
) -> Result<Vec<PendingReveal>, StoreError> {
    let mut pending = Vec::new();

    for market_id in store.list_unrevealed()? {
        let Some(secret) = store.retrieve(&market_id)? else {
            continue;
        };
        let expiration = markets
            .iter()
            .find(|m| m.market_id == market_id)
            .map(|m| m.expiration);

        pending.push(PendingReveal {
            deadline: expiration.map(|e| window.deadline(e)),
            status: expiration.map(|e| window.status(e)),
            market_id,
            secret,
        });
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::commitment::{generate_commit, Outcome};
    use crate::core::address::Address;
    use crate::core::amount::Amount;
    use crate::core::clock::ManualClock;
    use crate::store::InMemoryRepository;
    use std::sync::Arc;

    const HOUR: i64 = 3_600_000;
    const T1: TimestampMs = 1_700_000_000_000;

    fn bettor() -> Address {
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
    }

    fn make_secret() -> CommitSecret {
        let commit = generate_commit(Outcome::Yes, &bettor());
        CommitSecret::new(&commit, Outcome::Yes, Amount::from_minor(1), T1 - HOUR)
    }

    fn setup(now: TimestampMs) -> (SecretStore<InMemoryRepository>, RevealWindow<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let store = SecretStore::new(InMemoryRepository::new());
        for id in ["expired", "open", "untracked"] {
            store.store(id, &make_secret()).unwrap();
        }
        (store, RevealWindow::new(clock.clone()), clock)
    }

    fn markets() -> Vec<MarketExpiry> {
        vec![
            MarketExpiry::new("expired", T1 - 2 * HOUR),
            MarketExpiry::new("open", T1),
            MarketExpiry::new("not-ours", T1 - 10 * HOUR),
        ]
    }

    #[test]
    fn test_sweep_clears_only_expired() {
        let (store, window, _clock) = setup(T1 + HOUR / 2);
        let report = sweep_expired(&store, &window, &markets()).unwrap();

        assert_eq!(report.cleared, vec!["expired"]);
        assert_eq!(report.retained, vec!["open"]);
        assert_eq!(report.unknown, vec!["untracked"]);
        assert_eq!(store.list_unrevealed().unwrap(), vec!["open", "untracked"]);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let (store, window, _clock) = setup(T1 + 2 * HOUR);

        let first = sweep_expired(&store, &window, &markets()).unwrap();
        let after_first = store.list_unrevealed().unwrap();
        let second = sweep_expired(&store, &window, &markets()).unwrap();

        assert_eq!(first.cleared, vec!["expired", "open"]);
        assert!(second.cleared.is_empty());
        assert_eq!(store.list_unrevealed().unwrap(), after_first);
    }

    #[test]
    fn test_sweep_boundary() {
        let (store, window, clock) = setup(T1 + HOUR);
        let only_open = [MarketExpiry::new("open", T1)];

        // Exactly at the deadline the window is still open.
        assert!(sweep_expired(&store, &window, &only_open).unwrap().cleared.is_empty());

        clock.advance(1);
        assert_eq!(sweep_expired(&store, &window, &only_open).unwrap().cleared, vec!["open"]);
    }

    #[test]
    fn test_pending_reveals() {
        let (store, window, _clock) = setup(T1 + HOUR / 2);
        let pending = pending_reveals(&store, &window, &markets()).unwrap();

        assert_eq!(pending.len(), 3);
        let open = pending.iter().find(|p| p.market_id == "open").unwrap();
        assert_eq!(open.deadline, Some(T1 + HOUR));
        assert_eq!(open.status, Some(RevealStatus::Open { remaining_ms: HOUR / 2 }));

        let expired = pending.iter().find(|p| p.market_id == "expired").unwrap();
        assert_eq!(expired.status, Some(RevealStatus::Closed));

        let untracked = pending.iter().find(|p| p.market_id == "untracked").unwrap();
        assert_eq!(untracked.deadline, None);
        assert_eq!(untracked.status, None);
    }

    #[test]
    fn test_market_expiry_accepts_backend_field_names() {
        let parsed: Vec<MarketExpiry> =
            serde_json::from_str(r#"[{"id":"7","expiresAt":5},{"marketId":"8","expiration":6}]"#).unwrap();
        assert_eq!(parsed, vec![MarketExpiry::new("7", 5), MarketExpiry::new("8", 6)]);
    }
}
