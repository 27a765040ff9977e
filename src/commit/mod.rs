//! Commit-Reveal Protocol
//!
//! Hides a bettor's outcome until the market closes:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    COMMIT-REVEAL                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs   - Generate / verify keccak commitments     │
//! │  secret.rs       - Locally held opening (outcome, salt)     │
//! │  window.rs       - Reveal deadline and status               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod secret;
pub mod window;

// Re-export key types
pub use commitment::{
    compute_commit_hash, generate_commit, generate_commit_with_rng, verify_commit,
    verify_commit_hex, Commit, CommitError, Outcome,
};
pub use secret::{CommitSecret, MarketId};
pub use window::{
    can_reveal_at, format_time_remaining, reveal_deadline, DeadlineExpired, RevealStatus, RevealWindow,
    REVEAL_GRACE_PERIOD_MS,
};
