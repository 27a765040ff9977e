//! Reveal Window Policy
//!
//! A commitment may be opened until one grace period after its market
//! expires. Everything here is recomputed from the clock on each call.

use serde::Serialize;
use thiserror::Error;

use crate::core::clock::{Clock, TimestampMs};

/// Grace period after market expiration during which reveals are accepted.
pub const REVEAL_GRACE_PERIOD_MS: i64 = 3_600_000;

/// Last instant (inclusive) at which a reveal is accepted.
pub fn reveal_deadline(market_expiration: TimestampMs) -> TimestampMs {
    market_expiration.saturating_add(REVEAL_GRACE_PERIOD_MS)
}

/// Whether a reveal is permitted at `now`.
///
/// Also true while the market is still open; ordering against market close
/// belongs to the market state machine.
pub fn can_reveal_at(market_expiration: TimestampMs, now: TimestampMs) -> bool {
    now <= reveal_deadline(market_expiration)
}

/// Where a commitment sits relative to its reveal window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RevealStatus {
    /// Market has not expired yet.
    MarketOpen {
        /// Milliseconds until the market expires.
        until_expiration_ms: i64,
    },
    /// Market expired; reveal still accepted.
    Open {
        /// Milliseconds until the deadline.
        remaining_ms: i64,
    },
    /// Deadline passed.
    Closed,
}

impl RevealStatus {
    /// Classify a market at `now`.
    pub fn at(market_expiration: TimestampMs, now: TimestampMs) -> Self {
        let deadline = reveal_deadline(market_expiration);
        if now < market_expiration {
            RevealStatus::MarketOpen {
                until_expiration_ms: market_expiration.saturating_sub(now),
            }
        } else if now <= deadline {
            RevealStatus::Open {
                remaining_ms: deadline.saturating_sub(now),
            }
        } else {
            RevealStatus::Closed
        }
    }

    /// Whether a reveal is permitted in this state.
    pub fn can_reveal(&self) -> bool {
        !matches!(self, RevealStatus::Closed)
    }
}

/// Reveal attempted after the window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("reveal deadline {deadline} passed (now {now})")]
pub struct DeadlineExpired {
    /// Deadline (epoch ms).
    pub deadline: TimestampMs,
    /// Time of the attempt (epoch ms).
    pub now: TimestampMs,
}

/// Reveal window bound to a clock.
#[derive(Clone, Debug)]
pub struct RevealWindow<C> {
    clock: C,
}

impl<C: Clock> RevealWindow<C> {
    /// Create a window policy reading time from `clock`.
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Current time as seen by the policy.
    pub fn now(&self) -> TimestampMs {
        self.clock.now_ms()
    }

    /// Deadline for a market.
    pub fn deadline(&self, market_expiration: TimestampMs) -> TimestampMs {
        reveal_deadline(market_expiration)
    }

    /// Whether a reveal is permitted right now.
    pub fn can_reveal(&self, market_expiration: TimestampMs) -> bool {
        can_reveal_at(market_expiration, self.now())
    }

    /// Like [`RevealWindow::can_reveal`], returning the deadline on success.
    pub fn ensure_can_reveal(
        &self,
        market_expiration: TimestampMs,
    ) -> Result<TimestampMs, DeadlineExpired> {
        let deadline = reveal_deadline(market_expiration);
        let now = self.now();
        if now <= deadline {
            Ok(deadline)
        } else {
            Err(DeadlineExpired { deadline, now })
        }
    }

    /// Whether the window has irrevocably closed.
    pub fn is_expired(&self, market_expiration: TimestampMs) -> bool {
        !self.can_reveal(market_expiration)
    }

    /// Current status of a market's window.
    pub fn status(&self, market_expiration: TimestampMs) -> RevealStatus {
        RevealStatus::at(market_expiration, self.now())
    }

    /// Milliseconds left until the deadline (zero once closed).
    pub fn time_remaining(&self, market_expiration: TimestampMs) -> i64 {
        reveal_deadline(market_expiration)
            .saturating_sub(self.now())
            .max(0)
    }
}

/// Human-readable countdown: `"2d 3h"`, `"3h 15m"`, `"15m"`, or `"Expired"`.
pub fn format_time_remaining(remaining_ms: i64) -> String {
    if remaining_ms <= 0 {
        return "Expired".to_string();
    }

    const MINUTE: i64 = 60 * 1000;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    let days = remaining_ms / DAY;
    let hours = (remaining_ms % DAY) / HOUR;
    let minutes = (remaining_ms % HOUR) / MINUTE;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use std::sync::Arc;

    const T: TimestampMs = 1_700_000_000_000;

    #[test]
    fn test_deadline() {
        assert_eq!(reveal_deadline(T), T + 3_600_000);
        assert_eq!(reveal_deadline(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_window_boundary() {
        assert!(can_reveal_at(T, T + 3_599_999));
        assert!(can_reveal_at(T, T + 3_600_000));
        assert!(!can_reveal_at(T, T + 3_600_001));
    }

    #[test]
    fn test_future_expiration_is_revealable() {
        assert!(can_reveal_at(T, T - 86_400_000));
    }

    #[test]
    fn test_window_reads_clock_every_call() {
        let clock = Arc::new(ManualClock::new(T + 3_599_999));
        let window = RevealWindow::new(clock.clone());

        assert!(window.can_reveal(T));
        clock.advance(2);
        assert!(!window.can_reveal(T));
        assert!(window.is_expired(T));
    }

    #[test]
    fn test_ensure_can_reveal() {
        let clock = ManualClock::new(T + 3_600_000);
        let window = RevealWindow::new(&clock);
        assert_eq!(window.ensure_can_reveal(T), Ok(T + 3_600_000));

        clock.advance(1);
        assert_eq!(
            window.ensure_can_reveal(T),
            Err(DeadlineExpired { deadline: T + 3_600_000, now: T + 3_600_001 })
        );
    }

    #[test]
    fn test_status_transitions() {
        assert_eq!(
            RevealStatus::at(T, T - 1_000),
            RevealStatus::MarketOpen { until_expiration_ms: 1_000 }
        );
        assert_eq!(
            RevealStatus::at(T, T),
            RevealStatus::Open { remaining_ms: 3_600_000 }
        );
        assert_eq!(
            RevealStatus::at(T, T + 3_600_000),
            RevealStatus::Open { remaining_ms: 0 }
        );
        assert_eq!(RevealStatus::at(T, T + 3_600_001), RevealStatus::Closed);
        assert!(!RevealStatus::Closed.can_reveal());
    }

    #[test]
    fn test_time_remaining() {
        let clock = ManualClock::new(T + 30 * 60 * 1000);
        let window = RevealWindow::new(&clock);
        assert_eq!(window.time_remaining(T), 30 * 60 * 1000);

        clock.set(T + 2 * 3_600_000);
        assert_eq!(window.time_remaining(T), 0);
    }

    #[test]
    fn test_format_time_remaining() {
        assert_eq!(format_time_remaining(0), "Expired");
        assert_eq!(format_time_remaining(-5), "Expired");
        assert_eq!(format_time_remaining(59_000), "0m");
        assert_eq!(format_time_remaining(15 * 60 * 1000), "15m");
        assert_eq!(format_time_remaining(3 * 3_600_000 + 15 * 60 * 1000), "3h 15m");
        assert_eq!(format_time_remaining(2 * 86_400_000 + 3 * 3_600_000), "2d 3h");
    }
}
