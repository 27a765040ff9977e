//! Darkpool bet lifecycle.
//!
//! Ties generator, store, window and cleanup into the per-bet flow:
//!
//! ```text
//! commit_bet ──► (commitment submitted externally) ──► prepare_reveal
//!                                                        │
//!                      ┌─────────────────────────────────┤
//!                      ▼                                 ▼
//!              complete_reveal (clear)        sweep_expired (deadline missed)
//! ```

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::backup::{self, BackupError, ImportSummary};
use super::cleanup::{self, MarketExpiry, PendingReveal, SweepReport};
use crate::commit::commitment::{generate_commit_with_rng, Commit, Outcome};
use crate::commit::secret::{CommitSecret, MarketId};
use crate::commit::window::{format_time_remaining, DeadlineExpired, RevealWindow};
use crate::core::address::Address;
use crate::core::amount::Amount;
use crate::core::clock::{Clock, TimestampMs};
use crate::core::hash::CommitHash;
use crate::core::rng::Salt;
use crate::store::{ReconcileReport, SecretRepository, SecretStore, StoreError};

/// Shown to bettors before their first commitment.
pub const SECURITY_WARNING: &str = "\
IMPORTANT SECURITY NOTES:

1. Your bet secret is stored locally on this device, unencrypted
2. If you delete the local data, you will LOSE your reveal ability
3. Back up your commit data using the export function
4. Never share your reveal information before revealing on-chain
5. You have 1 hour after market expiration to reveal your bet

Store your reveal data safely!";

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum DarkpoolError {
    /// Storage failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Backup failure.
    #[error("backup error: {0}")]
    Backup(#[from] BackupError),

    /// A commitment for this market is already pending reveal.
    #[error("market {0} already has an unrevealed commitment")]
    AlreadyCommitted(MarketId),

    /// Stake must be positive.
    #[error("bet amount must be greater than zero")]
    ZeroAmount,

    /// No secret stored for this market on this device.
    #[error("no commit secret stored for market {0}")]
    SecretNotFound(MarketId),

    /// Reveal attempted after the window closed.
    #[error("reveal deadline {deadline} passed (now {now})")]
    DeadlineExpired {
        /// Deadline (epoch ms).
        deadline: TimestampMs,
        /// Time of the attempt (epoch ms).
        now: TimestampMs,
    },

    /// Stored opening does not hash to the stored commitment for this bettor.
    #[error("stored secret for market {0} does not open its commitment")]
    CommitmentMismatch(MarketId),
}

/// Everything the transaction layer needs to submit a reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealTicket {
    /// Market id.
    pub market_id: MarketId,
    /// Revealed outcome.
    pub outcome: Outcome,
    /// Revealed salt.
    pub salt: Salt,
    /// Commitment being opened.
    pub commit_hash: CommitHash,
    /// Stake (minor units).
    pub amount: Amount,
    /// Reveal deadline (epoch ms).
    pub deadline: TimestampMs,
}

/// Bettor-side darkpool client state.
pub struct Darkpool<R, C> {
    store: SecretStore<R>,
    window: RevealWindow<C>,
}

impl<R: SecretRepository, C: Clock> Darkpool<R, C> {
    /// Create a darkpool over a repository and clock.
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            store: SecretStore::new(repo),
            window: RevealWindow::new(clock),
        }
    }

    /// Secret store.
    pub fn store(&self) -> &SecretStore<R> {
        &self.store
    }

    /// Reveal window policy.
    pub fn window(&self) -> &RevealWindow<C> {
        &self.window
    }

    /// Commit to `outcome` on `market_id` with a fresh OS-random salt.
    ///
    /// Returns the commitment to submit alongside the stake. The secret is
    /// persisted before returning; if persistence fails nothing should be
    /// submitted.
    pub fn commit_bet(
        &self,
        market_id: &str,
        outcome: Outcome,
        amount: Amount,
        bettor: &Address,
    ) -> Result<Commit, DarkpoolError> {
        self.commit_bet_with_rng(&mut OsRng, market_id, outcome, amount, bettor)
    }

    /// [`Darkpool::commit_bet`] with an injected secure RNG.
    #[instrument(skip(self, rng, bettor), fields(bettor = %bettor.short()))]
    pub fn commit_bet_with_rng<G: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut G,
        market_id: &str,
        outcome: Outcome,
        amount: Amount,
        bettor: &Address,
    ) -> Result<Commit, DarkpoolError> {
        if amount.is_zero() {
            return Err(DarkpoolError::ZeroAmount);
        }
        if self.store.has_unrevealed(market_id)? {
            return Err(DarkpoolError::AlreadyCommitted(market_id.to_string()));
        }

        let commit = generate_commit_with_rng(rng, outcome, bettor);
        let secret = CommitSecret::new(&commit, outcome, amount, self.window.now());
        self.store.store(market_id, &secret)?;

        info!(commit_hash = %commit.commit_hash, "Committed bet");
        Ok(commit)
    }

    /// Load and check the opening for `market_id`.
    ///
    /// Fails if no secret is stored, the window has closed, or the stored
    /// opening does not hash to its commitment for `bettor`.
    #[instrument(skip(self, bettor))]
    pub fn prepare_reveal(
        &self,
        market_id: &str,
        market_expiration: TimestampMs,
        bettor: &Address,
    ) -> Result<RevealTicket, DarkpoolError> {
        let secret = self
            .store
            .retrieve(market_id)?
            .ok_or_else(|| DarkpoolError::SecretNotFound(market_id.to_string()))?;

        let deadline = self
            .window
            .ensure_can_reveal(market_expiration)
            .map_err(|DeadlineExpired { deadline, now }| {
                warn!(deadline, now, "Reveal attempted after deadline");
                DarkpoolError::DeadlineExpired { deadline, now }
            })?;

        if !secret.self_check(bettor) {
            return Err(DarkpoolError::CommitmentMismatch(market_id.to_string()));
        }

        Ok(RevealTicket {
            market_id: market_id.to_string(),
            outcome: secret.outcome,
            salt: secret.salt,
            commit_hash: secret.commit_hash,
            amount: secret.amount,
            deadline,
        })
    }

    /// Forget the secret after the chain accepted the reveal.
    #[instrument(skip(self))]
    pub fn complete_reveal(&self, market_id: &str) -> Result<(), DarkpoolError> {
        self.store.clear(market_id)?;
        info!("Reveal completed, secret cleared");
        Ok(())
    }

    /// Plain-text reveal instructions for a market, or `None` without a secret.
    pub fn reveal_instructions(&self, market_id: &str) -> Result<Option<String>, DarkpoolError> {
        let Some(secret) = self.store.retrieve(market_id)? else {
            return Ok(None);
        };

        Ok(Some(format!(
            "To reveal your bet on Market #{market_id}:\n\
             \n\
             1. Your secret outcome: {outcome}\n\
             2. Your bet amount: {amount} tokens\n\
             3. Do NOT share your reveal information with anyone\n\
             4. Make sure to reveal before the market's reveal deadline\n\
             \n\
             Your reveal will be verified against your commit hash on the blockchain.",
            outcome = secret.outcome.as_str().to_uppercase(),
            amount = secret.amount.format_token(),
        )))
    }

    /// Countdown text for a market's reveal window.
    pub fn time_remaining_text(&self, market_expiration: TimestampMs) -> String {
        format_time_remaining(self.window.time_remaining(market_expiration))
    }

    /// Discard secrets whose reveal window has closed.
    #[instrument(skip_all, fields(markets = markets.len()))]
    pub fn sweep_expired(&self, markets: &[MarketExpiry]) -> Result<SweepReport, DarkpoolError> {
        Ok(cleanup::sweep_expired(&self.store, &self.window, markets)?)
    }

    /// Unrevealed commitments with their deadlines.
    pub fn pending_reveals(
        &self,
        markets: &[MarketExpiry],
    ) -> Result<Vec<PendingReveal>, DarkpoolError> {
        Ok(cleanup::pending_reveals(&self.store, &self.window, markets)?)
    }

    /// Export all secrets as JSON.
    pub fn export_all(&self) -> Result<String, DarkpoolError> {
        Ok(backup::export_all(&self.store)?)
    }

    /// Import secrets from an export blob.
    pub fn import_all(&self, blob: &str) -> Result<ImportSummary, DarkpoolError> {
        Ok(backup::import_all(&self.store, blob)?)
    }

    /// Single-market reveal sheet as JSON.
    pub fn export_reveal_data(
        &self,
        market_id: &str,
        market_title: Option<&str>,
    ) -> Result<Option<String>, DarkpoolError> {
        Ok(backup::export_reveal_data(&self.store, market_id, market_title)?)
    }

    /// Repair the unrevealed-market registry.
    pub fn reconcile(&self) -> Result<ReconcileReport, DarkpoolError> {
        Ok(self.store.reconcile()?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::commitment::verify_commit;
    use crate::core::clock::ManualClock;
    use crate::store::InMemoryRepository;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;
    const T0: TimestampMs = 1_700_000_000_000;

    fn bettor() -> Address {
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
    }

    fn darkpool(now: TimestampMs) -> (Darkpool<InMemoryRepository, Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        (Darkpool::new(InMemoryRepository::new(), clock.clone()), clock)
    }

    #[test]
    fn test_market_42_scenario() {
        let (pool, clock) = darkpool(T0);
        let amount: Amount = "1000000000".parse().unwrap();

        let commit = pool.commit_bet("42", Outcome::Yes, amount, &bettor()).unwrap();
        assert_eq!(pool.store().list_unrevealed().unwrap(), vec!["42"]);
        let original = pool.store().retrieve("42").unwrap().unwrap();
        assert_eq!(original.timestamp, T0);
        assert_eq!(original.commit_hash, commit.commit_hash);

        clock.set(T0 + 30 * MINUTE);
        assert_eq!(pool.store().retrieve("42").unwrap(), Some(original));

        let t1 = T0 + 24 * HOUR;
        clock.set(t1 + 2 * HOUR);
        assert!(!pool.window().can_reveal(t1));
        assert!(matches!(
            pool.prepare_reveal("42", t1, &bettor()),
            Err(DarkpoolError::DeadlineExpired { .. })
        ));

        let report = pool.sweep_expired(&[MarketExpiry::new("42", t1)]).unwrap();
        assert_eq!(report.cleared, vec!["42"]);
        assert_eq!(pool.store().retrieve("42").unwrap(), None);
        assert!(pool.store().list_unrevealed().unwrap().is_empty());
    }

    #[test]
    fn test_reveal_flow() {
        let (pool, clock) = darkpool(T0);
        let mut rng = StdRng::seed_from_u64(99);
        let commit = pool
            .commit_bet_with_rng(&mut rng, "7", Outcome::No, Amount::from_minor(5), &bettor())
            .unwrap();

        let expiration = T0 + HOUR;
        clock.set(expiration + 10 * MINUTE);

        let ticket = pool.prepare_reveal("7", expiration, &bettor()).unwrap();
        assert_eq!(ticket.outcome, Outcome::No);
        assert_eq!(ticket.salt, commit.salt);
        assert_eq!(ticket.deadline, expiration + HOUR);
        assert!(verify_commit(&commit.commit_hash, ticket.outcome, &ticket.salt, &bettor()));

        pool.complete_reveal("7").unwrap();
        assert!(matches!(
            pool.prepare_reveal("7", expiration, &bettor()),
            Err(DarkpoolError::SecretNotFound(_))
        ));
    }

    #[test]
    fn test_reveal_rejects_wrong_bettor() {
        let (pool, _clock) = darkpool(T0);
        pool.commit_bet("1", Outcome::Yes, Amount::from_minor(1), &bettor()).unwrap();

        let other: Address = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap();
        assert!(matches!(
            pool.prepare_reveal("1", T0, &other),
            Err(DarkpoolError::CommitmentMismatch(_))
        ));
    }

    #[test]
    fn test_double_commit_rejected() {
        let (pool, _clock) = darkpool(T0);
        pool.commit_bet("1", Outcome::Yes, Amount::from_minor(1), &bettor()).unwrap();

        assert!(matches!(
            pool.commit_bet("1", Outcome::No, Amount::from_minor(1), &bettor()),
            Err(DarkpoolError::AlreadyCommitted(_))
        ));
        assert!(matches!(
            pool.commit_bet("2", Outcome::No, Amount::ZERO, &bettor()),
            Err(DarkpoolError::ZeroAmount)
        ));
    }

    #[test]
    fn test_reveal_instructions() {
        let (pool, _clock) = darkpool(T0);
        pool.commit_bet("9", Outcome::Yes, Amount::from_minor(2_000_000_000_000_000_000), &bettor())
            .unwrap();

        let text = pool.reveal_instructions("9").unwrap().unwrap();
        assert!(text.starts_with("To reveal your bet on Market #9:"));
        assert!(text.contains("1. Your secret outcome: YES"));
        assert!(text.contains("2. Your bet amount: 2.0 tokens"));
        assert_eq!(pool.reveal_instructions("missing").unwrap(), None);
    }

    #[test]
    fn test_time_remaining_text() {
        let (pool, clock) = darkpool(T0);
        assert_eq!(pool.time_remaining_text(T0), "1h 0m");
        clock.advance(45 * MINUTE);
        assert_eq!(pool.time_remaining_text(T0), "15m");
        clock.advance(HOUR);
        assert_eq!(pool.time_remaining_text(T0), "Expired");
    }

    #[test]
    fn test_backup_through_facade() {
        let (pool, _clock) = darkpool(T0);
        pool.commit_bet("a", Outcome::Yes, Amount::from_minor(1), &bettor()).unwrap();
        pool.commit_bet("b", Outcome::No, Amount::from_minor(2), &bettor()).unwrap();
        let blob = pool.export_all().unwrap();

        let (restored, _clock) = darkpool(T0);
        assert_eq!(restored.import_all(&blob).unwrap().imported, 2);
        for id in ["a", "b"] {
            assert_eq!(
                restored.store().retrieve(id).unwrap(),
                pool.store().retrieve(id).unwrap()
            );
            assert!(restored.prepare_reveal(id, T0, &bettor()).is_ok());
        }

        assert!(matches!(
            restored.import_all("{oops"),
            Err(DarkpoolError::Backup(BackupError::Format(_)))
        ));
    }
}
