//! Owned tick lifecycle around the timer engine.
//!
//! [`TimerService`] is the process-level host for one [`TimerEngine`]:
//! it loads the persisted state, runs the one-time catch-up pass, drives
//! the ~1 Hz tick, streams every snapshot to the store, and turns engine
//! events into notification side effects. No ambient globals - create it,
//! `start()` it, `stop()` it.
//!
//! Requires a tokio runtime. Mutators and the tick task serialize on one
//! mutex, so every update is a read-modify-write of the latest committed
//! state. Persistence is write-behind through a single ordered consumer:
//! the tick never waits on the store, and a stale snapshot can never land
//! after a fresher one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::events::Event;
use crate::notify::{Notifier, NOTIFICATION_ID};
use crate::storage::{KvStore, STATE_KEY};
use crate::timer::{Overall, State, Timer, TimerEngine};

pub struct TimerService {
    engine: Arc<Mutex<TimerEngine>>,
    store: Arc<dyn KvStore>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<Event>,
    tick_interval: Duration,
    tick_task: Mutex<Option<JoinHandle<()>>>,
    writer_task: Mutex<Option<JoinHandle<()>>>,
}

impl TimerService {
    /// Read the persisted state and build the service around it.
    ///
    /// An absent, unreadable, or unparsable snapshot means first run: the
    /// engine starts from the default empty state and the problem is only
    /// logged. When a snapshot is adopted, the catch-up pass runs here,
    /// before any tick.
    pub async fn load(
        store: Arc<dyn KvStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        let persisted = match store.get(STATE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<State>(&raw) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!("persisted state unreadable, starting fresh: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("state read failed, starting fresh: {e}");
                None
            }
        };

        let (engine, catch_up_event) = match persisted {
            Some(state) => {
                let mut engine = TimerEngine::with_state(state, clock);
                let event = engine.catch_up();
                (engine, event)
            }
            None => (TimerEngine::new(clock), None),
        };

        let (events, _) = broadcast::channel(256);
        let service = Self {
            engine: Arc::new(Mutex::new(engine)),
            store,
            notifier,
            events,
            tick_interval,
            tick_task: Mutex::new(None),
            writer_task: Mutex::new(None),
        };
        if let Some(event) = catch_up_event {
            dispatch(&service.events, &service.notifier, event);
        }
        service
    }

    /// Spawn the periodic tick. Each tick snapshots the pre-tick state
    /// for persistence, advances the engine, then dispatches the
    /// resulting event. Idempotent while running.
    pub fn start(&self) {
        let mut tick_guard = lock(&self.tick_task);
        if tick_guard.is_some() {
            return;
        }

        let (write_tx, mut write_rx) = mpsc::unbounded_channel::<String>();
        let store = Arc::clone(&self.store);
        let writer = tokio::spawn(async move {
            while let Some(json) = write_rx.recv().await {
                if let Err(e) = store.set(STATE_KEY, json).await {
                    tracing::warn!("state write failed, retrying next tick: {e}");
                }
            }
        });

        let engine = Arc::clone(&self.engine);
        let notifier = Arc::clone(&self.notifier);
        let events = self.events.clone();
        let period = self.tick_interval;
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let (snapshot, event) = {
                    let mut engine = lock(&engine);
                    let snapshot = serde_json::to_string(engine.state());
                    let event = engine.tick();
                    (snapshot, event)
                };
                match snapshot {
                    Ok(json) => {
                        let _ = write_tx.send(json);
                    }
                    Err(e) => tracing::error!("state serialization failed: {e}"),
                }
                if let Some(event) = event {
                    dispatch(&events, &notifier, event);
                }
            }
        });

        *tick_guard = Some(ticker);
        *lock(&self.writer_task) = Some(writer);
    }

    /// Tear the tick down. Pending writes may still land; call
    /// [`flush`](Self::flush) afterwards for a final synchronous persist.
    pub fn stop(&self) {
        if let Some(task) = lock(&self.tick_task).take() {
            task.abort();
        }
        if let Some(task) = lock(&self.writer_task).take() {
            task.abort();
        }
    }

    /// Persist the current state and wait for the write. Intended for
    /// shutdown, after [`stop`](Self::stop).
    pub async fn flush(&self) -> Result<(), CoreError> {
        let json = serde_json::to_string(&self.snapshot())?;
        self.store.set(STATE_KEY, json).await?;
        Ok(())
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> State {
        lock(&self.engine).state().clone()
    }

    /// Aggregate completion for today.
    pub fn overall(&self) -> Overall {
        lock(&self.engine).overall()
    }

    // ── Mutators ─────────────────────────────────────────────────────

    pub fn add_timer(&self, timer: Timer) -> Option<Event> {
        self.mutate(|e| e.add_timer(timer))
    }

    pub fn edit_timer(&self, timer: Timer) -> Option<Event> {
        self.mutate(|e| e.edit_timer(timer))
    }

    pub fn delete_timer(&self, name: &str) -> Option<Event> {
        self.mutate(|e| e.delete_timer(name))
    }

    pub fn focus_timer(&self, index: usize) -> Option<Event> {
        self.mutate(|e| e.focus_timer(index))
    }

    pub fn signal_start(&self) -> Option<Event> {
        self.mutate(TimerEngine::signal_start)
    }

    pub fn signal_pause(&self) -> Option<Event> {
        self.mutate(TimerEngine::signal_pause)
    }

    pub fn signal_stop(&self) -> Option<Event> {
        self.mutate(TimerEngine::signal_stop)
    }

    pub fn signal_reset(&self) -> Option<Event> {
        self.mutate(TimerEngine::signal_reset)
    }

    pub fn count_next(&self) -> Option<Event> {
        self.mutate(TimerEngine::count_next)
    }

    pub fn reset_all_timers(&self) -> Option<Event> {
        self.mutate(TimerEngine::reset_all_timers)
    }

    pub fn clear_saves(&self) -> Option<Event> {
        self.mutate(TimerEngine::clear_saves)
    }

    fn mutate(&self, f: impl FnOnce(&mut TimerEngine) -> Option<Event>) -> Option<Event> {
        let event = f(&mut lock(&self.engine));
        if let Some(event) = &event {
            dispatch(&self.events, &self.notifier, event.clone());
        }
        event
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Broadcast the event and kick off its notification side effect without
/// awaiting it - alert failures never stall or roll back state changes.
fn dispatch(events: &broadcast::Sender<Event>, notifier: &Arc<dyn Notifier>, event: Event) {
    apply_alert_effect(notifier, &event);
    let _ = events.send(event);
}

fn apply_alert_effect(notifier: &Arc<dyn Notifier>, event: &Event) {
    match event {
        Event::TimerStarted {
            name,
            remaining_secs,
            notify_at: Some(fire_at),
            ..
        } => {
            let notifier = Arc::clone(notifier);
            let title = format!("{name} Finished!");
            let body = remaining_secs.to_string();
            let fire_at = *fire_at;
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .schedule(NOTIFICATION_ID, &title, &body, fire_at)
                    .await
                {
                    tracing::warn!("alert schedule failed: {e}");
                }
            });
        }
        Event::TimerPaused { .. }
        | Event::TimerStopped { .. }
        | Event::TimerReset { .. }
        | Event::AllTimersReset { .. }
        | Event::DayRolledOver { .. } => {
            let notifier = Arc::clone(notifier);
            tokio::spawn(async move {
                if let Err(e) = notifier.cancel(NOTIFICATION_ID).await {
                    tracing::warn!("alert cancel failed: {e}");
                }
            });
        }
        _ => {}
    }
}
