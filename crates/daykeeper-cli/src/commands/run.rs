use std::sync::Arc;
use std::time::Duration;

use daykeeper_core::{storage, Config, FileStore, Notifier, NullNotifier, SystemClock, TimerService};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use crate::common::CliResult;
use crate::notifier::DesktopNotifier;

/// Host the timer service in the foreground: tick, persist, fire alerts,
/// and stream every event to stdout as JSON lines until ctrl-c.
pub async fn run() -> CliResult {
    let config = Config::load()?;
    let store = Arc::new(FileStore::new(storage::data_dir()?)?);
    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        Arc::new(DesktopNotifier::new())
    } else {
        Arc::new(NullNotifier)
    };

    let service = TimerService::load(
        store,
        notifier,
        Arc::new(SystemClock),
        Duration::from_secs(config.tick.interval_secs.max(1)),
    )
    .await;

    let mut events = service.subscribe();
    service.start();
    info!("daykeeper service running, ctrl-c to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("event stream lagged, {skipped} event(s) dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    service.stop();
    service.flush().await?;
    info!("state flushed, goodbye");
    Ok(())
}
