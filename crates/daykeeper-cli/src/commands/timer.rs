use clap::Subcommand;
use daykeeper_core::Event;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start counting down the focused timer
    Start,
    /// Pause the countdown, keeping focus
    Pause,
    /// Stop and drop focus
    Stop,
    /// Wind the focused timer back to its full budget
    Reset,
    /// Consume one step of the focused counter
    Next,
    /// Wind every timer back to its full budget
    ResetAll,
    /// Print the current state as JSON
    Status,
}

pub async fn run(action: TimerAction) -> CliResult {
    let store = common::open_store()?;
    let mut engine = common::load_engine(&store).await?;

    match action {
        TimerAction::Start => match engine.signal_start() {
            Some(Event::TimerStarted {
                name,
                remaining_secs,
                notify_at,
                ..
            }) => {
                common::save_engine(&store, &engine).await?;
                println!(
                    "Started '{name}', {} remaining",
                    common::pretty_time(remaining_secs)
                );
                if notify_at.is_none() {
                    println!("(finishes after midnight; no alert will fire)");
                }
            }
            _ => return Err("nothing to start: no focused timer, or already running".into()),
        },
        TimerAction::Pause => match engine.signal_pause() {
            Some(Event::TimerPaused { remaining_secs, .. }) => {
                common::save_engine(&store, &engine).await?;
                println!("Paused, {} remaining", common::pretty_time(remaining_secs));
            }
            _ => return Err("nothing to pause".into()),
        },
        TimerAction::Stop => {
            engine.signal_stop();
            common::save_engine(&store, &engine).await?;
            println!("Stopped");
        }
        TimerAction::Reset => match engine.signal_reset() {
            Some(Event::TimerReset { name, .. }) => {
                common::save_engine(&store, &engine).await?;
                println!("Reset '{name}'");
            }
            _ => return Err("no focused timer to reset".into()),
        },
        TimerAction::Next => match engine.count_next() {
            Some(Event::CounterStepped { name, remaining, .. }) => {
                common::save_engine(&store, &engine).await?;
                println!("'{name}': {remaining} step(s) left");
            }
            _ => return Err("focused timer is not a counter".into()),
        },
        TimerAction::ResetAll => {
            engine.reset_all_timers();
            common::save_engine(&store, &engine).await?;
            println!("All timers reset");
        }
        TimerAction::Status => {
            common::save_engine(&store, &engine).await?;
            println!("{}", serde_json::to_string_pretty(engine.state())?);
        }
    }
    Ok(())
}
