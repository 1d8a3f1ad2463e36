//! Time source abstraction.
//!
//! The engine never reads the system clock directly. All wall-clock reads
//! and calendar-day comparisons go through [`Clock`] so day-rollover and
//! catch-up arithmetic can be driven deterministically in tests.

use chrono::{FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Milliseconds in one calendar day (ignoring DST shifts).
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Wall-clock capability used by the timer engine.
///
/// `day_of` maps an epoch-millisecond instant to a calendar date in the
/// clock's timezone; everything day-related derives from it.
pub trait Clock: Send + Sync {
    /// Current instant as milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Calendar date of an instant, in the clock's timezone.
    fn day_of(&self, epoch_ms: i64) -> NaiveDate;

    /// Whether two instants fall on the same calendar day.
    fn same_day(&self, a_ms: i64, b_ms: i64) -> bool {
        self.day_of(a_ms) == self.day_of(b_ms)
    }

    /// Whole seconds elapsed from `from_ms` to `to_ms`, floored at zero.
    fn elapsed_secs(&self, from_ms: i64, to_ms: i64) -> u64 {
        ((to_ms - from_ms) / 1000).max(0) as u64
    }
}

/// System wall clock. Calendar days are evaluated in the local timezone,
/// matching what the user's "today" means.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn day_of(&self, epoch_ms: i64) -> NaiveDate {
        Local
            .timestamp_millis_opt(epoch_ms)
            .earliest()
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

/// Settable clock for tests. Only advances when told to, so day-boundary
/// and catch-up logic replay deterministically.
///
/// Days are evaluated against a fixed UTC offset instead of the host
/// timezone, keeping test expectations portable.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
    offset: FixedOffset,
}

impl ManualClock {
    /// Clock pinned at `start_ms`, using UTC days.
    pub fn new(start_ms: i64) -> Self {
        Self::with_offset(start_ms, 0)
    }

    /// Clock pinned at `start_ms` with a fixed UTC offset in seconds.
    pub fn with_offset(start_ms: i64, offset_secs: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix());
        Self {
            now_ms: AtomicI64::new(start_ms),
            offset,
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, epoch_ms: i64) {
        self.now_ms.store(epoch_ms, Ordering::SeqCst);
    }

    /// Advance by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.now_ms.fetch_add(secs * 1000, Ordering::SeqCst);
    }

    /// Advance by whole days.
    pub fn advance_days(&self, days: i64) {
        self.now_ms.fetch_add(days * MS_PER_DAY, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn day_of(&self, epoch_ms: i64) -> NaiveDate {
        self.offset
            .timestamp_millis_opt(epoch_ms)
            .earliest()
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}
