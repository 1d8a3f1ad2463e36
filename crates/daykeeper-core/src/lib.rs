//! # Daykeeper Core Library
//!
//! Core business logic for Daykeeper, a daily countdown task tracker:
//! named timers count down once per day, progress survives restarts, and
//! each elapsed day leaves an immutable completion record behind for the
//! history heatmap.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based state machine over one `State`
//!   aggregate; the caller (normally [`TimerService`]) drives `tick()`
//! - **Storage**: an opaque async key-value gateway holding one JSON
//!   snapshot, plus TOML-based configuration
//! - **Clock**: injectable time source so day-rollover and catch-up
//!   arithmetic are testable
//! - **Notify**: schedule/cancel contract for the single completion alert
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: mutators, tick, load catch-up, daily rollover
//! - [`TimerService`]: owned tick lifecycle, persistence, event stream
//! - [`KvStore`]: persistence gateway ([`FileStore`], [`MemoryStore`])
//! - [`Config`]: application configuration

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod notify;
pub mod service;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{ConfigError, CoreError, NotifyError, StoreError};
pub use events::Event;
pub use notify::{Notifier, NullNotifier, NOTIFICATION_ID};
pub use service::TimerService;
pub use storage::{FileStore, KvStore, MemoryStore, STATE_KEY};
pub use timer::{Overall, Save, State, Timer, TimerEngine, NO_FOCUS};
