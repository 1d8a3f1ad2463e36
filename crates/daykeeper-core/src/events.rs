use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in the engine produces an Event.
/// The CLI prints them; a GUI would subscribe; the service layer reacts to
/// them for notification scheduling. No observer ever reaches into the
/// engine's state mid-mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerAdded {
        name: String,
        at: DateTime<Utc>,
    },
    TimerEdited {
        name: String,
        at: DateTime<Utc>,
    },
    TimerDeleted {
        name: String,
        at: DateTime<Utc>,
    },
    TimerFocused {
        index: usize,
        name: String,
        at: DateTime<Utc>,
    },
    TimerStarted {
        name: String,
        remaining_secs: u64,
        /// When the completion alert should fire (epoch ms), or `None`
        /// when the fire time falls on a different calendar day and the
        /// alert is dropped.
        notify_at: Option<i64>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    TimerReset {
        name: String,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero on its own and playback halted.
    TimerCompleted {
        name: String,
        at: DateTime<Utc>,
    },
    CounterStepped {
        name: String,
        remaining: u64,
        at: DateTime<Utc>,
    },
    AllTimersReset {
        at: DateTime<Utc>,
    },
    /// A calendar-day boundary was crossed: history saved, timers reset.
    DayRolledOver {
        /// Save records appended (1 + one zero record per missed day).
        saves_appended: u32,
        /// Completion percentage recorded for the elapsed day.
        completion: u8,
        at: DateTime<Utc>,
    },
    /// Wall-clock seconds lost while the process was down were subtracted
    /// from the focused timer during the post-load catch-up pass.
    ElapsedReconciled {
        recovered_secs: u64,
        at: DateTime<Utc>,
    },
    SavesCleared {
        at: DateTime<Utc>,
    },
}
