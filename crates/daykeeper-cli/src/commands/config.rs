use clap::Subcommand;
use daykeeper_core::Config;

use crate::common::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration as TOML
    Show,
    /// Get a value by dot-separated key, e.g. "tick.interval_secs"
    Get { key: String },
    /// Set a value by dot-separated key and persist
    Set { key: String, value: String },
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown configuration key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}
