use clap::Subcommand;
use daykeeper_core::history::{completion_by_day, current_streak, heat_bucket};
use daykeeper_core::SystemClock;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Per-day completion over the last window, ending yesterday
    Show {
        /// Window size in days
        #[arg(long, default_value_t = 90)]
        days: i64,
        /// Print the date-keyed series as JSON
        #[arg(long)]
        json: bool,
    },
    /// Today's aggregate completion
    Overall,
    /// Consecutive days at or above a completion threshold
    Streak {
        /// Minimum completion percentage that keeps the streak alive
        #[arg(long, default_value_t = 50)]
        min: u8,
    },
    /// Drop the whole history. Irreversible
    Clear,
}

pub async fn run(action: HistoryAction) -> CliResult {
    let store = common::open_store()?;
    let mut engine = common::load_engine(&store).await?;
    // Loading may have rolled a day over; keep that on disk regardless of
    // which query runs.
    common::save_engine(&store, &engine).await?;

    match action {
        HistoryAction::Show { days, json } => {
            let series = completion_by_day(&engine.state().saves, &SystemClock, days);
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else if series.is_empty() {
                println!("No history yet.");
            } else {
                for (day, completion) in &series {
                    let bar = "#".repeat(heat_bucket(*completion) as usize);
                    println!("{day}  {completion:>3}%  {bar}");
                }
            }
        }
        HistoryAction::Overall => {
            println!("Today: {}%", engine.overall().percent());
        }
        HistoryAction::Streak { min } => {
            let streak = current_streak(&engine.state().saves, &SystemClock, min);
            println!("{streak} day(s) at {min}%+");
        }
        HistoryAction::Clear => {
            engine.clear_saves();
            common::save_engine(&store, &engine).await?;
            println!("History cleared");
        }
    }
    Ok(())
}
