//! The persisted state aggregate.
//!
//! One [`State`] per process, serialized in full as a single JSON blob
//! under the `"state"` store key. Field layout round-trips losslessly;
//! `focus` keeps the `-1` sentinel on the wire so old snapshots stay
//! readable.

use serde::{Deserialize, Serialize};

/// Sentinel focus value meaning "no timer focused".
pub const NO_FOCUS: i32 = -1;

/// A named countdown unit.
///
/// `delta` counts the remaining budget: it starts at `total` and is
/// driven down to 0 by ticks (or by `count_next` for counter timers).
/// Invariant: `0 <= delta <= total` after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Display name; identity key for delete.
    pub name: String,
    /// Configured duration in seconds, or the target count for counters.
    pub total: u64,
    /// Remaining seconds (or count-steps).
    pub delta: u64,
    /// Advanced by discrete manual steps instead of wall-clock ticking.
    #[serde(default)]
    pub counter: bool,
    /// Display color (hex), carried for the presentation layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Timer {
    /// A fresh wall-clock countdown of `total_secs`.
    pub fn countdown(name: impl Into<String>, total_secs: u64) -> Self {
        Self {
            name: name.into(),
            total: total_secs,
            delta: total_secs,
            counter: false,
            color: None,
        }
    }

    /// A fresh manual counter with `steps` steps.
    pub fn counter(name: impl Into<String>, steps: u64) -> Self {
        Self {
            name: name.into(),
            total: steps,
            delta: steps,
            counter: true,
            color: None,
        }
    }

    /// Remaining fraction in `[0, 1]`. A zero-length timer counts as done.
    pub fn remaining_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.delta as f64 / self.total as f64
        }
    }

    /// Whether the countdown has run out.
    pub fn is_complete(&self) -> bool {
        self.delta == 0
    }
}

/// An immutable historical record of one day's completion.
///
/// Created only by the daily rollover, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Save {
    /// Instant within the calendar day this record represents (epoch ms).
    pub date: i64,
    /// Snapshot of all timers' configuration at save time.
    pub timers: Vec<Timer>,
    /// Aggregate completion percentage for that day, `0..=100`.
    pub completion: u8,
}

/// Aggregate completion pair reported by `get_overall`.
///
/// `delta` is the completed fraction and `total` the full scale (1.0),
/// both zero for an empty timer list so display code never divides by
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overall {
    pub delta: f64,
    pub total: f64,
}

impl Overall {
    /// Rounded percentage for display and for `Save::completion`.
    pub fn percent(&self) -> u8 {
        if self.total <= 0.0 {
            0
        } else {
            ((self.delta / self.total) * 100.0).round().clamp(0.0, 100.0) as u8
        }
    }
}

/// The single process-wide aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Last tick or load instant (epoch ms); day-boundary reference.
    pub date: i64,
    /// Whether the focused timer is counting down.
    pub active: bool,
    /// Index into `timers`, or [`NO_FOCUS`].
    pub focus: i32,
    /// Insertion-ordered timers, index-addressed by `focus`.
    pub timers: Vec<Timer>,
    /// Append-only chronological history.
    #[serde(default)]
    pub saves: Vec<Save>,
}

impl State {
    /// Default empty state dated at `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        Self {
            date: now_ms,
            active: false,
            focus: NO_FOCUS,
            timers: Vec::new(),
            saves: Vec::new(),
        }
    }

    /// The focus index, if it addresses an existing timer.
    ///
    /// Any out-of-range value (including the `-1` sentinel) reads as
    /// "nothing focused" so stale snapshots degrade to no-ops instead of
    /// panicking in a background tick.
    pub fn focused_index(&self) -> Option<usize> {
        usize::try_from(self.focus)
            .ok()
            .filter(|&i| i < self.timers.len())
    }

    /// The focused timer, if any.
    pub fn focused(&self) -> Option<&Timer> {
        self.focused_index().map(|i| &self.timers[i])
    }

    /// Mutable access to the focused timer, if any.
    pub fn focused_mut(&mut self) -> Option<&mut Timer> {
        let i = self.focused_index()?;
        Some(&mut self.timers[i])
    }
}
