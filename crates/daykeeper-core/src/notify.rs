//! Notification trigger contract.
//!
//! The engine drives exactly one local alert at a time: when the focused
//! timer starts, an alert is scheduled for its projected finish instant;
//! pause/stop/reset cancel it. Delivery is someone else's problem - a
//! failed schedule or cancel never affects timer state.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::NotifyError;

/// The single notification id the engine multiplexes on.
pub const NOTIFICATION_ID: u32 = 1;

/// Schedules and cancels local alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Schedule an alert to fire at `fire_at_ms` (epoch ms). A second
    /// schedule under the same id replaces the first.
    async fn schedule(
        &self,
        id: u32,
        title: &str,
        body: &str,
        fire_at_ms: i64,
    ) -> Result<(), NotifyError>;

    /// Cancel the pending alert under `id`, if any.
    async fn cancel(&self, id: u32) -> Result<(), NotifyError>;
}

/// Notifier that does nothing. Used by one-shot CLI commands and anywhere
/// alerts are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn schedule(
        &self,
        _id: u32,
        _title: &str,
        _body: &str,
        _fire_at_ms: i64,
    ) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn cancel(&self, _id: u32) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// A schedule/cancel call observed by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCall {
    Schedule {
        id: u32,
        title: String,
        fire_at_ms: i64,
    },
    Cancel {
        id: u32,
    },
}

/// Test double that records every trigger call in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifyCall>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn schedule(
        &self,
        id: u32,
        title: &str,
        _body: &str,
        fire_at_ms: i64,
    ) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(NotifyCall::Schedule {
                id,
                title: title.to_string(),
                fire_at_ms,
            });
        Ok(())
    }

    async fn cancel(&self, id: u32) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(NotifyCall::Cancel { id });
        Ok(())
    }
}
