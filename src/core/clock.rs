//! Wall-clock access.
//!
//! Time-dependent policy reads "now" through [`Clock`] so tests can pin it.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

/// Unix epoch milliseconds.
pub type TimestampMs = i64;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current Unix time in milliseconds.
    fn now_ms(&self) -> TimestampMs;
}

/// System wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock fixed at `now_ms`.
    pub fn new(now_ms: TimestampMs) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: TimestampMs) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Move forward by `delta_ms`.
    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> TimestampMs {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> TimestampMs {
        (**self).now_ms()
    }
}

/// ISO-8601 UTC rendering with millisecond precision.
pub fn to_iso8601(timestamp_ms: TimestampMs) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
