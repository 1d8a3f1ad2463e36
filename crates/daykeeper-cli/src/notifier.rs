//! Desktop notification backend for the foreground service.
//!
//! `schedule` spawns a sleeper task that shows a system notification at
//! the fire instant; `cancel` aborts it. One pending alert per id, and a
//! re-schedule under the same id replaces the previous one.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use daykeeper_core::{Notifier, NotifyError};
use tokio::task::JoinHandle;

#[derive(Default)]
pub struct DesktopNotifier {
    pending: Mutex<HashMap<u32, JoinHandle<()>>>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<u32, JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn schedule(
        &self,
        id: u32,
        title: &str,
        body: &str,
        fire_at_ms: i64,
    ) -> Result<(), NotifyError> {
        let title = title.to_string();
        let body = body.to_string();
        let now_ms = chrono::Local::now().timestamp_millis();
        let delay = Duration::from_millis(fire_at_ms.saturating_sub(now_ms).max(0) as u64);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // notify-rust talks to the desktop bus synchronously.
            let shown = tokio::task::spawn_blocking(move || {
                notify_rust::Notification::new()
                    .summary(&title)
                    .body(&body)
                    .show()
                    .map(|_| ())
            })
            .await;
            match shown {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("notification display failed: {e}"),
                Err(e) => tracing::warn!("notification task failed: {e}"),
            }
        });

        if let Some(previous) = self.pending().insert(id, task) {
            previous.abort();
        }
        Ok(())
    }

    async fn cancel(&self, id: u32) -> Result<(), NotifyError> {
        if let Some(task) = self.pending().remove(&id) {
            task.abort();
        }
        Ok(())
    }
}
