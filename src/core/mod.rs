//! Core primitives.
//!
//! Fixed-width byte types, amounts and time used by the commit-reveal protocol.
//! Everything here is free of storage and policy concerns.

/// Implements 0x-hex `Display`, `FromStr` and serde string encoding for a
/// fixed-width byte newtype exposing `from_bytes` and `as_bytes`.
macro_rules! impl_hex_codec {
    ($ty:ty, $len:expr) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&$crate::core::hash::encode_prefixed(self.as_bytes()))
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::core::hash::EncodingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $crate::core::hash::decode_hex_array::<$len>(s).map(<$ty>::from_bytes)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod address;
pub mod amount;
pub mod clock;
pub mod hash;
pub mod rng;

// Re-export core types
pub use address::Address;
pub use amount::{Amount, AmountError, TOKEN_DECIMALS};
pub use clock::{Clock, ManualClock, SystemClock, TimestampMs};
pub use hash::{CommitHash, CommitHasher, EncodingError};
pub use rng::{Salt, SALT_LEN};
