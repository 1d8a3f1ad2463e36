use clap::{Parser, Subcommand};

mod commands;
mod common;
mod notifier;

#[derive(Parser)]
#[command(name = "daykeeper", version, about = "Daykeeper CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Countdown control for the focused timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Daily completion history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the foreground tick service until ctrl-c
    Run,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daykeeper=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Timer { action } => commands::timer::run(action).await,
        Commands::History { action } => commands::history::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Run => commands::run::run().await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
