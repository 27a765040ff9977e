//! Bet Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BET LIFECYCLE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  darkpool.rs  - Commit, reveal and clear per market         │
//! │  cleanup.rs   - Sweep secrets past their reveal deadline    │
//! │  backup.rs    - Export / import / reveal sheets             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod backup;
pub mod cleanup;
pub mod darkpool;

// Re-export key types
pub use backup::{
    export_all, export_reveal_data, import_all, parse_backup, reveal_sheet, BackupError,
    ImportFailure, ImportSummary, RevealSheet,
};
pub use cleanup::{pending_reveals, sweep_expired, MarketExpiry, PendingReveal, SweepReport};
pub use darkpool::{Darkpool, DarkpoolError, RevealTicket, SECURITY_WARNING};
