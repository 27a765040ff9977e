//! Secret persistence.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SECRET STORAGE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  repository.rs   - Key/value backend trait + StoreError     │
//! │  memory.rs       - In-memory backend (tests, sessions)      │
//! │  file.rs         - One-file-per-key durable backend         │
//! │  secret_store.rs - Secrets + unrevealed-market registry     │
//! │  salts.rs        - Used-salt fingerprint ledger             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod file;
pub mod memory;
pub mod repository;
pub mod salts;
pub mod secret_store;

// Re-export key types
pub use file::FileRepository;
pub use memory::InMemoryRepository;
pub use repository::{SecretRepository, StoreError};
pub use secret_store::{ReconcileReport, SecretStore, REGISTRY_KEY, SECRET_KEY_PREFIX};
