//! Injectable time source.
//!
//! # Responsibility
//! - Provide the engine's notion of "now" at millisecond precision.
//! - Allow deterministic temporal tests through [`ManualClock`].
//!
//! # Invariants
//! - Every instant returned by a clock is truncated to whole milliseconds.

use chrono::{DateTime, NaiveDate, TimeDelta, Timelike, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant, truncated to milliseconds.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        truncate_to_millis(Utc::now())
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(truncate_to_millis(at)),
        }
    }

    /// Moves the clock to `at` (backwards moves are allowed).
    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = truncate_to_millis(at);
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = truncate_to_millis(*current + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Drops sub-millisecond precision from `instant`.
pub fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = instant.nanosecond();
    instant
        .with_nanosecond(nanos - nanos % 1_000_000)
        .unwrap_or(instant)
}

/// Calendar day of `instant` (UTC), used for same-day matching.
pub fn calendar_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}
