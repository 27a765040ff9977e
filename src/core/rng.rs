//! Commitment Salts
//!
//! Salts blind the bettor's outcome inside the commitment. They must come from
//! a cryptographically secure source: every constructor that draws randomness
//! is bounded on `RngCore + CryptoRng`, and the default source is the OS RNG.
//!
//! # Example
//!
//! ```
//! use darkpool::core::rng::Salt;
//! use rand::rngs::OsRng;
//!
//! let a = Salt::generate(&mut OsRng);
//! let b = Salt::generate(&mut OsRng);
//! assert_ne!(a, b);
//! ```

use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use super::hash::{decode_hex_array, hash_with_domain, Digest32, EncodingError};

/// Salt width in bytes.
pub const SALT_LEN: usize = 32;

/// Domain separator for local salt fingerprints.
const SALT_FINGERPRINT_DOMAIN: &[u8] = b"DARKPOOL_SALT_FP_V1";

/// Single-use 32-byte commitment salt.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from a secure RNG.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SALT_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Draw a fresh salt from the operating system RNG.
    pub fn random() -> Self {
        Self::generate(&mut OsRng)
    }

    /// Wrap raw salt bytes.
    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, rejecting anything but exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        let array: [u8; SALT_LEN] = bytes.try_into().map_err(|_| EncodingError::InvalidLength {
            expected: SALT_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(array))
    }

    /// Parse from hex (any casing, `0x` optional).
    pub fn from_hex(input: &str) -> Result<Self, EncodingError> {
        decode_hex_array::<SALT_LEN>(input).map(Self)
    }

    /// Raw salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    /// One-way fingerprint used to detect reuse without storing a second
    /// copy of the salt.
    pub fn fingerprint(&self) -> Digest32 {
        hash_with_domain(SALT_FINGERPRINT_DOMAIN, &self.0)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only a prefix; full salts do not belong in logs.
        write!(f, "Salt(0x{}…)", hex::encode(&self.0[..4]))
    }
}

impl_hex_codec!(Salt, SALT_LEN);

// =============================================================================
// TESTS
// =============================================================================
