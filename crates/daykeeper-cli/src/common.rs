//! Shared helpers for one-shot CLI commands.
//!
//! One-shot commands mirror what the long-running service does on launch:
//! load the snapshot, run the catch-up pass, apply one mutation, persist.
//! The catch-up pass is what keeps countdowns honest between invocations
//! with no daemon running.

use std::error::Error;
use std::sync::Arc;

use daykeeper_core::{storage, FileStore, KvStore, State, SystemClock, TimerEngine, STATE_KEY};

pub type CliResult = Result<(), Box<dyn Error>>;

/// Open the state store in the user's data directory.
pub fn open_store() -> Result<FileStore, Box<dyn Error>> {
    Ok(FileStore::new(storage::data_dir()?)?)
}

/// Load the persisted state and run the one-time catch-up pass.
pub async fn load_engine(store: &FileStore) -> Result<TimerEngine, Box<dyn Error>> {
    let clock = Arc::new(SystemClock);
    let engine = match store.get(STATE_KEY).await? {
        Some(raw) => match serde_json::from_str::<State>(&raw) {
            Ok(state) => {
                let mut engine = TimerEngine::with_state(state, clock);
                engine.catch_up();
                engine
            }
            Err(e) => {
                tracing::warn!("persisted state unreadable, starting fresh: {e}");
                TimerEngine::new(clock)
            }
        },
        None => TimerEngine::new(clock),
    };
    Ok(engine)
}

/// Persist the engine's state back to the store.
pub async fn save_engine(store: &FileStore, engine: &TimerEngine) -> CliResult {
    let json = serde_json::to_string(engine.state())?;
    store.set(STATE_KEY, json).await?;
    Ok(())
}

/// Parse a human duration into seconds: "90" or "90s", "25m", "1h30m".
/// A trailing bare number counts as seconds.
pub fn parse_duration(s: &str) -> Result<u64, String> {
    let s = s.trim().to_ascii_lowercase();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total: u64 = 0;
    let mut num = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            num.push(c);
        } else {
            let n: u64 = num
                .parse()
                .map_err(|_| format!("invalid duration '{s}'"))?;
            num.clear();
            let mult = match c {
                'h' => 3600,
                'm' => 60,
                's' => 1,
                _ => return Err(format!("invalid unit '{c}' in '{s}'")),
            };
            total += n * mult;
        }
    }
    if !num.is_empty() {
        total += num.parse::<u64>().map_err(|_| format!("invalid duration '{s}'"))?;
    }
    Ok(total)
}

/// "1h 05m 12s" style rendering of a second count.
pub fn pretty_time(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}
