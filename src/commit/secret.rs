//! Bettor secrets.
//!
//! Everything needed to open a commitment later. Held only on the bettor's
//! device; the JSON field names are the persisted record format.

use serde::{Deserialize, Serialize};

use crate::commit::commitment::{compute_commit_hash, Commit, Outcome};
use crate::core::address::Address;
use crate::core::amount::Amount;
use crate::core::clock::TimestampMs;
use crate::core::hash::CommitHash;
use crate::core::rng::Salt;

/// Market identifier as issued by the backend.
pub type MarketId = String;

/// Locally held opening of a commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSecret {
    /// Copy of the published commitment, for self-check.
    pub commit_hash: CommitHash,
    /// Blinding salt.
    pub salt: Salt,
    /// Hidden outcome.
    pub outcome: Outcome,
    /// Stake in minor units.
    pub amount: Amount,
    /// Creation time (epoch ms).
    pub timestamp: TimestampMs,
}

impl CommitSecret {
    /// Build the secret for a freshly generated commitment.
    pub fn new(commit: &Commit, outcome: Outcome, amount: Amount, timestamp: TimestampMs) -> Self {
        Self {
            commit_hash: commit.commit_hash,
            salt: commit.salt,
            outcome,
            amount,
            timestamp,
        }
    }

    /// Check that the stored opening still hashes to the stored commitment
    /// for `bettor`.
    pub fn self_check(&self, bettor: &Address) -> bool {
        compute_commit_hash(self.outcome, &self.salt, bettor) == self.commit_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::commitment::generate_commit;

    fn bettor() -> Address {
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
    }

    #[test]
    fn test_record_format() {
        let secret = CommitSecret {
            commit_hash: CommitHash::from_bytes([0xaa; 32]),
            salt: Salt::from_bytes([0xbb; 32]),
            outcome: Outcome::Yes,
            amount: Amount::from_minor(1_000_000_000),
            timestamp: 1_700_000_000_000,
        };

        let value = serde_json::to_value(&secret).unwrap();
        assert_eq!(value["commitHash"], format!("0x{}", "aa".repeat(32)));
        assert_eq!(value["salt"], format!("0x{}", "bb".repeat(32)));
        assert_eq!(value["outcome"], "yes");
        assert_eq!(value["amount"], "1000000000");
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);

        let parsed: CommitSecret = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, secret);
    }

    #[test]
    fn test_reads_uppercase_record() {
        let json = format!(
            r#"{{"commitHash":"0x{}","salt":"0x{}","outcome":"no","amount":"5","timestamp":1}}"#,
            "AB".repeat(32),
            "CD".repeat(32)
        );
        let parsed: CommitSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.commit_hash, CommitHash::from_bytes([0xab; 32]));
        assert_eq!(parsed.outcome, Outcome::No);
    }

    #[test]
    fn test_self_check() {
        let commit = generate_commit(Outcome::No, &bettor());
        let secret = CommitSecret::new(&commit, Outcome::No, Amount::from_minor(10), 0);
        assert!(secret.self_check(&bettor()));

        let tampered = CommitSecret {
            outcome: Outcome::Yes,
            ..secret.clone()
        };
        assert!(!tampered.self_check(&bettor()));
    }
}
