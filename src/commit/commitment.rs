//! Bet Commitment Protocol
//!
//! Commit to a hidden outcome when the bet is placed.
//! Reveal `(outcome, salt)` after the market closes so the contract can
//! recompute `keccak256(abi.encodePacked(bool, bytes32, address))`.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::address::Address;
use crate::core::hash::{CommitHash, CommitHasher, EncodingError};
use crate::core::rng::Salt;

/// Binary market outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Encoded as `true`.
    Yes,
    /// Encoded as `false`.
    No,
}

impl Outcome {
    /// Boolean flag used in the packed encoding.
    pub const fn as_flag(self) -> bool {
        matches!(self, Outcome::Yes)
    }

    /// Lowercase literal used in persisted records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Yes => "yes",
            Outcome::No => "no",
        }
    }

    /// The other outcome.
    pub const fn opposite(self) -> Self {
        match self {
            Outcome::Yes => Outcome::No,
            Outcome::No => Outcome::Yes,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = CommitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Outcome::Yes),
            "no" => Ok(Outcome::No),
            other => Err(CommitError::InvalidOutcome(other.to_string())),
        }
    }
}

/// Output of [`generate_commit`]: the public hash and the private salt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commit {
    /// Published commitment.
    pub commit_hash: CommitHash,
    /// Kept secret until reveal.
    pub salt: Salt,
}

/// Malformed protocol input.
///
/// These indicate caller bugs (bad hex, wrong widths), never a mismatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitError {
    /// Outcome literal was not `yes` or `no`.
    #[error("invalid outcome: {0:?}")]
    InvalidOutcome(String),
    /// Salt was not 32 bytes of hex.
    #[error("invalid salt: {0}")]
    InvalidSalt(EncodingError),
    /// Address was absent, not 20 bytes, or failed its checksum.
    #[error("invalid bettor address: {0}")]
    InvalidAddress(EncodingError),
}

/// Compute the commitment hash for a fixed salt.
pub fn compute_commit_hash(outcome: Outcome, salt: &Salt, bettor: &Address) -> CommitHash {
    let mut hasher = CommitHasher::new();
    hasher.update_bool(outcome.as_flag());
    hasher.update_bytes32(salt.as_bytes());
    hasher.update_address(bettor);
    hasher.finalize()
}

/// Generate a commitment with a fresh salt from the OS RNG.
pub fn generate_commit(outcome: Outcome, bettor: &Address) -> Commit {
    generate_commit_with_rng(&mut OsRng, outcome, bettor)
}

/// Generate a commitment with a fresh salt from `rng`.
pub fn generate_commit_with_rng<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    outcome: Outcome,
    bettor: &Address,
) -> Commit {
    let salt = Salt::generate(rng);
    let commit_hash = compute_commit_hash(outcome, &salt, bettor);
    Commit { commit_hash, salt }
}

/// Check that `(outcome, salt, bettor)` opens `commit_hash`.
pub fn verify_commit(
    commit_hash: &CommitHash,
    outcome: Outcome,
    salt: &Salt,
    bettor: &Address,
) -> bool {
    compute_commit_hash(outcome, salt, bettor) == *commit_hash
}

/// String-typed variant of [`verify_commit`].
///
/// The hash comparison ignores casing and `0x` prefix; a hash that does not
/// parse is a mismatch. Malformed salts or addresses are errors.
pub fn verify_commit_hex(
    commit_hash: &str,
    outcome: Outcome,
    salt: &str,
    bettor: &str,
) -> Result<bool, CommitError> {
    let salt = Salt::from_hex(salt).map_err(CommitError::InvalidSalt)?;
    let bettor: Address = bettor.parse().map_err(CommitError::InvalidAddress)?;

    Ok(compute_commit_hash(outcome, &salt, &bettor).matches_hex(commit_hash))
}
