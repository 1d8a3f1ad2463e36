mod engine;
mod state;

pub use engine::TimerEngine;
pub use state::{Overall, Save, State, Timer, NO_FOCUS};
