//! Commitment Hashing
//!
//! Provides the hashing used by the commit-reveal protocol:
//! - Keccak-256 over the contract's packed encoding (commitment hash)
//! - Domain-separated SHA-256 (local fingerprints, never published)
//! - Fixed-width hex codecs shared by hashes, salts and addresses

use sha2::{Digest, Sha256};
use sha3::Keccak256;
use thiserror::Error;

use super::address::Address;

/// Raw 256-bit digest.
pub type Digest32 = [u8; 32];

/// Errors decoding fixed-width hex values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    /// Input was empty (or only a `0x` prefix).
    #[error("empty hex input")]
    Empty,
    /// Input contained non-hex characters or had odd length.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// Decoded value had the wrong width.
    #[error("expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required width in bytes.
        expected: usize,
        /// Width actually decoded.
        got: usize,
    },
    /// Mixed-case address failed its EIP-55 checksum.
    #[error("address checksum mismatch")]
    BadChecksum,
}

/// Strip an optional `0x`/`0X` prefix and surrounding whitespace.
pub fn strip_hex_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Decode a hex string (prefix optional, any casing) into exactly `N` bytes.
pub fn decode_hex_array<const N: usize>(input: &str) -> Result<[u8; N], EncodingError> {
    let digits = strip_hex_prefix(input);
    if digits.is_empty() {
        return Err(EncodingError::Empty);
    }

    let bytes = hex::decode(digits)?;
    if bytes.len() != N {
        return Err(EncodingError::InvalidLength {
            expected: N,
            got: bytes.len(),
        });
    }

    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Lowercase hex with a `0x` prefix.
pub fn encode_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Public commitment digest published on-chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitHash([u8; 32]);

impl CommitHash {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: Digest32) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &Digest32 {
        &self.0
    }

    /// Compare against a hex string regardless of casing or `0x` prefix.
    ///
    /// Unparseable input is simply not equal.
    pub fn matches_hex(&self, other: &str) -> bool {
        let digits = strip_hex_prefix(other);
        digits.len() == 64 && digits.eq_ignore_ascii_case(&hex::encode(self.0))
    }
}

impl std::fmt::Debug for CommitHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CommitHash({})", self)
    }
}

impl_hex_codec!(CommitHash, 32);

/// Keccak-256 hasher for the commitment preimage.
///
/// Mirrors `abi.encodePacked`: values are appended without padding or length
/// prefixes, so the order and widths of updates are the wire contract.
pub struct CommitHasher {
    hasher: Keccak256,
}

impl Default for CommitHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitHasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self {
            hasher: Keccak256::new(),
        }
    }

    /// Append a `bool` as a single byte (`0x01` / `0x00`).
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.hasher.update([value as u8]);
    }

    /// Append a `bytes32` verbatim.
    #[inline]
    pub fn update_bytes32(&mut self, value: &[u8; 32]) {
        self.hasher.update(value);
    }

    /// Append an `address` as its 20 raw bytes.
    #[inline]
    pub fn update_address(&mut self, address: &Address) {
        self.hasher.update(address.as_bytes());
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> CommitHash {
        CommitHash(self.hasher.finalize().into())
    }
}

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Digest32 {
    Keccak256::digest(data).into()
}

/// SHA-256 with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

// =============================================================================
// TESTS
// =============================================================================
