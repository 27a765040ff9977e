//! Runtime configuration.
//!
//! Read from `DARKPOOL_*` environment variables; CLI flags override.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::address::Address;
use crate::core::hash::EncodingError;

/// Default directory for the file-backed secret store.
pub const DEFAULT_DATA_DIR: &str = "./darkpool-data";

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `DARKPOOL_BETTOR` is not a valid address.
    #[error("DARKPOOL_BETTOR is not a valid address: {0}")]
    InvalidBettor(EncodingError),
}

/// Darkpool client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one file per stored key.
    pub data_dir: PathBuf,
    /// `tracing_subscriber` filter directive.
    pub log_filter: String,
    /// Bettor address used when a command does not name one.
    pub bettor: Option<Address>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            bettor: None,
        }
    }
}

impl Config {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bettor = non_empty("DARKPOOL_BETTOR")
            .map(|raw| raw.trim().parse::<Address>())
            .transpose()
            .map_err(ConfigError::InvalidBettor)?;

        Ok(Self {
            data_dir: non_empty("DARKPOOL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            log_filter: non_empty("DARKPOOL_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            bettor,
        })
    }
}
