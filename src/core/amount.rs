//! Bet stake amounts.
//!
//! Stakes are integer minor units (wei-like). Persisted as decimal strings,
//! parsed once at the boundary into a `u128`.

use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Decimals of the settlement token (1 token = 10^18 minor units).
pub const TOKEN_DECIMALS: u32 = 18;

/// Amount parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Empty input.
    #[error("empty amount")]
    Empty,
    /// Input was not a plain decimal integer.
    #[error("invalid amount: {0:?}")]
    Invalid(String),
    /// Value does not fit in 128 bits.
    #[error("amount overflows 128 bits: {0}")]
    Overflow(String),
}

/// Stake in minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(u128);

impl Amount {
    /// Zero stake.
    pub const ZERO: Amount = Amount(0);

    /// Wrap a minor-unit value.
    pub const fn from_minor(value: u128) -> Self {
        Self(value)
    }

    /// Minor-unit value.
    pub const fn minor(&self) -> u128 {
        self.0
    }

    /// Check for a zero stake.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Render with a decimal point, trimming trailing zeros but keeping at
    /// least one fractional digit (`1000000000000000000` → `"1.0"`).
    pub fn format_units(&self, decimals: u32) -> String {
        let scale = 10u128.pow(decimals);
        let whole = self.0 / scale;
        let frac = self.0 % scale;

        if decimals == 0 {
            return whole.to_string();
        }

        let padded = format!("{:0width$}", frac, width = decimals as usize);
        let trimmed = padded.trim_end_matches('0');
        let frac_str = if trimmed.is_empty() { "0" } else { trimmed };
        format!("{}.{}", whole, frac_str)
    }

    /// Render in whole tokens.
    pub fn format_token(&self) -> String {
        self.format_units(TOKEN_DECIMALS)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Invalid(trimmed.to_string()));
        }

        trimmed.parse::<u128>().map(Self).map_err(|e| match e.kind() {
            IntErrorKind::PosOverflow => AmountError::Overflow(trimmed.to_string()),
            _ => AmountError::Invalid(trimmed.to_string()),
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Accepts decimal strings (the persisted form) and plain JSON integers.
struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer amount as a decimal string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(v as u128))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u128::try_from(v)
            .map(Amount)
            .map_err(|_| E::custom(format!("negative amount: {}", v)))
    }
}

// =============================================================================
// TESTS
// =============================================================================
