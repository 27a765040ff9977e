//! Bettor chain addresses.
//!
//! 20-byte EVM account identifiers. Parsing accepts all-lowercase or
//! all-uppercase hex, and validates the EIP-55 checksum of mixed-case input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::hash::{decode_hex_array, keccak256, strip_hex_prefix, EncodingError};

/// Address width in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Canonical fixed-width account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes (the packed encoding).
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// EIP-55 mixed-case checksum form.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(2 + lower.len());
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (digest[i / 2] >> if i % 2 == 0 { 4 } else { 0 }) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Abbreviated form for logs, e.g. `0xf39f…2266`.
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex_array::<ADDRESS_LEN>(s)?;
        let address = Self(bytes);

        let digits = strip_hex_prefix(s);
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *digits {
            return Err(EncodingError::BadChecksum);
        }

        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eip55_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let address: Address = expected.to_lowercase().parse().unwrap();
            assert_eq!(address.to_checksum(), expected);
            assert_eq!(expected.parse::<Address>().unwrap(), address);
        }
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // Flip the case of one letter in a valid checksum address.
        let result = "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse::<Address>();
        assert_eq!(result, Err(EncodingError::BadChecksum));
    }

    #[test]
    fn test_uppercase_accepted() {
        let address: Address = "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266".parse().unwrap();
        assert_eq!(address.to_string(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }

    #[test]
    fn test_malformed_addresses() {
        assert_eq!("".parse::<Address>(), Err(EncodingError::Empty));
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(EncodingError::InvalidLength { expected: 20, got: 2 })
        ));
        assert!(matches!(
            "0xg39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse::<Address>(),
            Err(EncodingError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_short_form() {
        let address: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
        assert_eq!(address.short(), "0xf39f…2266");
    }
}
