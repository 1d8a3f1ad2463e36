use clap::Subcommand;
use daykeeper_core::Timer;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a countdown timer (--duration "25m") or a counter (--count N)
    Add {
        /// Display name, also the identity key for delete
        name: String,
        /// Daily countdown budget, e.g. "25m", "1h30m", "90s"
        #[arg(long, value_parser = common::parse_duration, conflicts_with = "count")]
        duration: Option<u64>,
        /// Daily step target for a manual counter
        #[arg(long)]
        count: Option<u64>,
        /// Display color (hex), used by presentation layers
        #[arg(long)]
        color: Option<String>,
    },
    /// Edit the focused timer, keeping any field not given
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = common::parse_duration, conflicts_with = "count")]
        duration: Option<u64>,
        #[arg(long)]
        count: Option<u64>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete the timer with this name
    Delete { name: String },
    /// List timers
    List {
        /// Print the raw timer list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Focus the timer at this index
    Focus { index: usize },
}

pub async fn run(action: TaskAction) -> CliResult {
    let store = common::open_store()?;
    let mut engine = common::load_engine(&store).await?;

    match action {
        TaskAction::Add {
            name,
            duration,
            count,
            color,
        } => {
            let mut timer = match (duration, count) {
                (Some(secs), None) => Timer::countdown(name, secs),
                (None, Some(steps)) => Timer::counter(name, steps),
                _ => return Err("one of --duration or --count is required".into()),
            };
            timer.color = color;
            let added = timer.name.clone();
            engine.add_timer(timer);
            common::save_engine(&store, &engine).await?;
            println!("Added '{added}'");
        }
        TaskAction::Edit {
            name,
            duration,
            count,
            color,
        } => {
            let Some(current) = engine.state().focused().cloned() else {
                return Err("no focused timer to edit (use `daykeeper task focus`)".into());
            };
            let mut next = current;
            if let Some(n) = name {
                next.name = n;
            }
            if let Some(secs) = duration {
                next.total = secs;
                next.delta = next.delta.min(secs);
                next.counter = false;
            }
            if let Some(steps) = count {
                next.total = steps;
                next.delta = next.delta.min(steps);
                next.counter = true;
            }
            if let Some(c) = color {
                next.color = Some(c);
            }
            let edited = next.name.clone();
            engine.edit_timer(next);
            common::save_engine(&store, &engine).await?;
            println!("Updated '{edited}'");
        }
        TaskAction::Delete { name } => {
            let removed = engine.delete_timer(&name).is_some();
            common::save_engine(&store, &engine).await?;
            if removed {
                println!("Deleted '{name}' (history preserved)");
            } else {
                println!("No timer named '{name}'");
            }
        }
        TaskAction::List { json } => {
            common::save_engine(&store, &engine).await?;
            let state = engine.state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state.timers)?);
            } else if state.timers.is_empty() {
                println!("No timers. Add one with `daykeeper task add`.");
            } else {
                for (i, t) in state.timers.iter().enumerate() {
                    let marker = if state.focused_index() == Some(i) {
                        "*"
                    } else {
                        " "
                    };
                    let progress = if t.counter {
                        format!("{} of {} steps left", t.delta, t.total)
                    } else {
                        format!(
                            "{} of {} left",
                            common::pretty_time(t.delta),
                            common::pretty_time(t.total)
                        )
                    };
                    println!("{marker} [{i}] {} - {progress}", t.name);
                }
            }
        }
        TaskAction::Focus { index } => {
            match engine.focus_timer(index) {
                Some(_) => {
                    common::save_engine(&store, &engine).await?;
                    println!("Focused [{index}]");
                }
                None => return Err(format!("no timer at index {index}").into()),
            }
        }
    }
    Ok(())
}
