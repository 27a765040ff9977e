//! # Darkpool Commit
//!
//! Bettor-side core of commit-reveal prediction-market betting: positions stay
//! hidden until the market resolves.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DARKPOOL COMMIT                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                               │
//! │  ├── hash.rs     - Keccak-256 commitment hashing, hex codec │
//! │  ├── address.rs  - 20-byte addresses, EIP-55 checksums      │
//! │  ├── amount.rs   - Token amounts in minor units             │
//! │  ├── rng.rs      - Secure 32-byte salts                     │
//! │  └── clock.rs    - Injectable wall clock                    │
//! │                                                             │
//! │  commit/         - Commit-reveal protocol                   │
//! │  ├── commitment.rs - Generate / verify commitments          │
//! │  ├── secret.rs   - Locally held opening                     │
//! │  └── window.rs   - Reveal deadline policy                   │
//! │                                                             │
//! │  store/          - Secret persistence                       │
//! │  ├── repository.rs - Key/value backend trait                │
//! │  ├── memory.rs / file.rs - Backends                         │
//! │  ├── secret_store.rs - Secrets + unrevealed registry        │
//! │  └── salts.rs    - Used-salt ledger                         │
//! │                                                             │
//! │  lifecycle/      - Per-bet flow                             │
//! │  ├── darkpool.rs - Commit, reveal, clear                    │
//! │  ├── cleanup.rs  - Expired secret sweep                     │
//! │  └── backup.rs   - Export / import                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Binding Guarantee
//!
//! The commitment is `keccak256(bool ‖ salt ‖ address)` with the exact packed
//! layout the on-chain verifier recomputes. A revealed (outcome, salt) pair
//! only verifies for the bettor address it was committed under.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod commit;
pub mod config;
pub mod lifecycle;
pub mod store;

// Re-export commonly used types
pub use crate::core::{Address, Amount, Clock, CommitHash, Salt, SystemClock, TimestampMs};
pub use commit::{
    compute_commit_hash, generate_commit, verify_commit, Commit, CommitSecret, MarketId, Outcome,
    RevealWindow, REVEAL_GRACE_PERIOD_MS,
};
pub use config::Config;
pub use lifecycle::{Darkpool, DarkpoolError, MarketExpiry, SECURITY_WARNING};
pub use store::{FileRepository, InMemoryRepository, SecretRepository, SecretStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
