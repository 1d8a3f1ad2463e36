//! Timer state engine.
//!
//! The engine is a wall-clock-based state machine over a single [`State`]
//! aggregate. It does not use internal threads - the caller is responsible
//! for calling `tick()` at a ~1 second cadence and for persisting the
//! state it exposes.
//!
//! ## Protocol
//!
//! ```text
//! load persisted State -> catch_up() once -> tick() forever
//! ```
//!
//! Every mutator is a synchronous read-modify-write of the latest state
//! and returns the [`Event`] it produced, if any. Repeated invocations
//! are safe: a second `signal_pause()` is a no-op.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::state::{Overall, Save, State, Timer, NO_FOCUS};
use crate::clock::{Clock, MS_PER_DAY};
use crate::events::Event;

pub struct TimerEngine {
    state: State,
    clock: Arc<dyn Clock>,
    /// The post-load catch-up pass runs at most once per engine.
    caught_up: bool,
}

impl TimerEngine {
    /// Fresh engine with an empty state dated "now". First-run path; no
    /// catch-up is pending.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let state = State::new(clock.now_ms());
        Self {
            state,
            clock,
            caught_up: true,
        }
    }

    /// Engine adopting a persisted state. Call [`catch_up`](Self::catch_up)
    /// before the first tick.
    pub fn with_state(state: State, clock: Arc<dyn Clock>) -> Self {
        Self {
            state,
            clock,
            caught_up: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn into_state(self) -> State {
        self.state
    }

    /// Aggregate completion across all timers: the mean completed
    /// fraction, paired with a unit scale. `{0, 0}` for zero timers.
    ///
    /// Monotonic: reducing any timer's `delta` never lowers `delta`.
    pub fn overall(&self) -> Overall {
        let n = self.state.timers.len();
        if n == 0 {
            return Overall {
                delta: 0.0,
                total: 0.0,
            };
        }
        let remaining: f64 = self.state.timers.iter().map(Timer::remaining_ratio).sum();
        Overall {
            delta: (n as f64 - remaining) / n as f64,
            total: 1.0,
        }
    }

    // ── Mutators ─────────────────────────────────────────────────────

    /// Append a timer. Names are not deduplicated here; duplicate names
    /// are a data-quality concern for the caller.
    pub fn add_timer(&mut self, timer: Timer) -> Option<Event> {
        let timer = clamp_delta(timer);
        let name = timer.name.clone();
        self.state.timers.push(timer);
        Some(Event::TimerAdded {
            name,
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Replace the timer at the focused index. No-op when nothing valid
    /// is focused (edit is only reachable through a focused timer).
    pub fn edit_timer(&mut self, timer: Timer) -> Option<Event> {
        let i = self.state.focused_index()?;
        let timer = clamp_delta(timer);
        let name = timer.name.clone();
        self.state.timers[i] = timer;
        Some(Event::TimerEdited {
            name,
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Remove the first timer matching `name`, then unconditionally drop
    /// focus and halt playback. The reset happens even when no name
    /// matched.
    pub fn delete_timer(&mut self, name: &str) -> Option<Event> {
        let removed = self
            .state
            .timers
            .iter()
            .position(|t| t.name == name)
            .map(|i| self.state.timers.remove(i));
        self.state.active = false;
        self.state.focus = NO_FOCUS;
        removed.map(|t| Event::TimerDeleted {
            name: t.name,
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Focus the timer at `index`. The caller supplies an index obtained
    /// from the current timer list.
    pub fn focus_timer(&mut self, index: usize) -> Option<Event> {
        self.state.focus = i32::try_from(index).unwrap_or(NO_FOCUS);
        let name = self.state.focused()?.name.clone();
        Some(Event::TimerFocused {
            index,
            name,
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Begin counting down the focused timer.
    ///
    /// The returned event carries the alert fire time, or `None` when the
    /// countdown would finish on a different calendar day - cross-midnight
    /// alerts are dropped.
    pub fn signal_start(&mut self) -> Option<Event> {
        if self.state.active {
            return None; // Already running.
        }
        let now = self.clock.now_ms();
        let (name, remaining_secs) = {
            let t = self.state.focused()?;
            (t.name.clone(), t.delta)
        };
        let fire_at = now + remaining_secs as i64 * 1000;
        let notify_at = self.clock.same_day(now, fire_at).then_some(fire_at);
        self.state.active = true;
        Some(Event::TimerStarted {
            name,
            remaining_secs,
            notify_at,
            at: self.at(now),
        })
    }

    /// Halt the countdown, keeping focus. Cancels the pending alert.
    pub fn signal_pause(&mut self) -> Option<Event> {
        if !self.state.active {
            return None;
        }
        self.state.active = false;
        let remaining_secs = self.state.focused().map_or(0, |t| t.delta);
        Some(Event::TimerPaused {
            remaining_secs,
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Leave focus view: halt and drop focus. Cancels the pending alert.
    pub fn signal_stop(&mut self) -> Option<Event> {
        if !self.state.active && self.state.focus == NO_FOCUS {
            return None;
        }
        self.state.active = false;
        self.state.focus = NO_FOCUS;
        Some(Event::TimerStopped {
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Halt and wind the focused timer back to its full budget.
    pub fn signal_reset(&mut self) -> Option<Event> {
        let name = {
            let t = self.state.focused_mut()?;
            t.delta = t.total;
            t.name.clone()
        };
        self.state.active = false;
        Some(Event::TimerReset {
            name,
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Manual step for counter timers: consume one step, clamped at zero.
    /// No-op for wall-clock timers.
    pub fn count_next(&mut self) -> Option<Event> {
        let (name, remaining) = {
            let t = self.state.focused_mut()?;
            if !t.counter {
                return None;
            }
            t.delta = t.delta.saturating_sub(1);
            (t.name.clone(), t.delta)
        };
        Some(Event::CounterStepped {
            name,
            remaining,
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Wind every timer back to its full budget. Cancels the pending
    /// alert; playback state is left untouched.
    pub fn reset_all_timers(&mut self) -> Option<Event> {
        for t in &mut self.state.timers {
            t.delta = t.total;
        }
        Some(Event::AllTimersReset {
            at: self.at(self.clock.now_ms()),
        })
    }

    /// Drop the whole history. Irreversible.
    pub fn clear_saves(&mut self) -> Option<Event> {
        self.state.saves.clear();
        Some(Event::SavesCleared {
            at: self.at(self.clock.now_ms()),
        })
    }

    // ── Load & tick protocol ─────────────────────────────────────────

    /// One-time reconciliation after adopting a persisted state.
    ///
    /// Crossed a day boundary while down: roll over before any tick runs.
    /// Same day and mid-countdown: subtract the wall-clock seconds the
    /// process missed. Subsequent calls are no-ops.
    pub fn catch_up(&mut self) -> Option<Event> {
        if self.caught_up {
            return None;
        }
        self.caught_up = true;

        let now = self.clock.now_ms();
        if !self.clock.same_day(self.state.date, now) {
            return Some(self.rollover(now));
        }
        if self.state.active {
            let lost = self.clock.elapsed_secs(self.state.date, now);
            if let Some(t) = self.state.focused_mut() {
                t.delta = t.delta.saturating_sub(lost);
            }
            self.state.date = now;
            tracing::debug!(secs = lost, "reconciled offline countdown");
            return Some(Event::ElapsedReconciled {
                recovered_secs: lost,
                at: self.at(now),
            });
        }
        self.state.date = now;
        None
    }

    /// One periodic update. The caller persists the pre-tick state;
    /// this advances it.
    ///
    /// Day changed: save-and-reset. Otherwise, while active, consume one
    /// second from the focused timer and halt when it runs out; while
    /// idle, just move the heartbeat date forward.
    pub fn tick(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        if !self.clock.same_day(self.state.date, now) {
            return Some(self.rollover(now));
        }

        let event = if self.state.active {
            let mut completed = None;
            let mut keep_running = false;
            if let Some(t) = self.state.focused_mut() {
                if t.delta > 0 {
                    t.delta -= 1;
                    if t.delta == 0 {
                        completed = Some(t.name.clone());
                    } else {
                        keep_running = true;
                    }
                }
            }
            if !keep_running {
                // Countdown finished, was already at zero, or focus no
                // longer addresses a timer: halt instead of ticking
                // forever.
                self.state.active = false;
            }
            completed.map(|name| Event::TimerCompleted {
                name,
                at: self.at(now),
            })
        } else {
            None
        };

        self.state.date = now;
        event
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Save-and-reset across a day boundary.
    ///
    /// Records the elapsed day's completion from the pre-reset state,
    /// backfills a zero-completion record per fully missed day, then
    /// winds every timer back and halts playback.
    fn rollover(&mut self, now_ms: i64) -> Event {
        let prev_date = self.state.date;
        let completion = self.overall().percent();

        self.state.saves.push(Save {
            date: prev_date,
            timers: self.state.timers.clone(),
            completion,
        });
        let mut appended: u32 = 1;

        // Days strictly between the last active day and today had no
        // activity at all.
        let gap = (self.clock.day_of(now_ms) - self.clock.day_of(prev_date)).num_days();
        for i in 1..gap {
            self.state.saves.push(Save {
                date: prev_date + i * MS_PER_DAY,
                timers: self.state.timers.clone(),
                completion: 0,
            });
            appended += 1;
        }

        for t in &mut self.state.timers {
            t.delta = t.total;
        }
        self.state.active = false;
        self.state.date = now_ms;

        tracing::debug!(completion, saves = appended, "day rollover");
        Event::DayRolledOver {
            saves_appended: appended,
            completion,
            at: self.at(now_ms),
        }
    }

    fn at(&self, now_ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(now_ms)
            .earliest()
            .unwrap_or_else(Utc::now)
    }
}

/// Mutators accept caller-supplied timers; keep `delta <= total` no matter
/// what arrives.
fn clamp_delta(mut timer: Timer) -> Timer {
    timer.delta = timer.delta.min(timer.total);
    timer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    // 2024-03-01T12:00:00Z
    const NOON: i64 = 1_709_294_400_000;

    fn engine_with(timers: Vec<Timer>) -> (TimerEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(NOON));
        let mut state = State::new(NOON);
        state.timers = timers;
        let mut engine = TimerEngine::with_state(state, clock.clone());
        engine.catch_up();
        (engine, clock)
    }

    #[test]
    fn start_tick_pause_reset_cycle() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Read", 600)]);
        engine.focus_timer(0);

        assert!(engine.signal_start().is_some());
        assert!(engine.state().active);

        for _ in 0..5 {
            clock.advance_secs(1);
            engine.tick();
        }
        assert_eq!(engine.state().timers[0].delta, 595);

        assert!(engine.signal_pause().is_some());
        assert!(!engine.state().active);
        assert_eq!(engine.state().timers[0].delta, 595);

        assert!(engine.signal_reset().is_some());
        assert_eq!(engine.state().timers[0].delta, 600);
        assert!(!engine.state().active);
    }

    #[test]
    fn start_is_idempotent() {
        let (mut engine, _clock) = engine_with(vec![Timer::countdown("Read", 600)]);
        engine.focus_timer(0);
        assert!(engine.signal_start().is_some());
        assert!(engine.signal_start().is_none());
    }

    #[test]
    fn pause_without_active_is_noop() {
        let (mut engine, _clock) = engine_with(vec![Timer::countdown("Read", 600)]);
        engine.focus_timer(0);
        assert!(engine.signal_pause().is_none());
    }

    #[test]
    fn countdown_completes_and_halts() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Sprint", 2)]);
        engine.focus_timer(0);
        engine.signal_start();

        clock.advance_secs(1);
        assert!(engine.tick().is_none());
        assert!(engine.state().active);

        clock.advance_secs(1);
        let event = engine.tick();
        assert!(matches!(event, Some(Event::TimerCompleted { .. })));
        assert!(!engine.state().active);
        assert_eq!(engine.state().timers[0].delta, 0);

        // Further ticks leave the finished timer alone.
        clock.advance_secs(1);
        assert!(engine.tick().is_none());
        assert_eq!(engine.state().timers[0].delta, 0);
    }

    #[test]
    fn tick_with_stale_focus_halts_instead_of_panicking() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Read", 10)]);
        engine.focus_timer(0);
        engine.signal_start();
        engine.state.timers.clear();
        engine.state.focus = 0;

        clock.advance_secs(1);
        assert!(engine.tick().is_none());
        assert!(!engine.state().active);
    }

    #[test]
    fn idle_tick_moves_heartbeat_forward() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Read", 600)]);
        clock.advance_secs(3);
        engine.tick();
        assert_eq!(engine.state().date, NOON + 3000);
    }

    #[test]
    fn delete_resets_playback_even_for_unfocused_timer() {
        let (mut engine, _clock) = engine_with(vec![
            Timer::countdown("A", 10),
            Timer::countdown("B", 20),
        ]);
        engine.focus_timer(0);
        engine.signal_start();

        assert!(engine.delete_timer("B").is_some());
        assert_eq!(engine.state().timers.len(), 1);
        assert!(!engine.state().active);
        assert_eq!(engine.state().focus, NO_FOCUS);
    }

    #[test]
    fn delete_unknown_name_still_resets() {
        let (mut engine, _clock) = engine_with(vec![Timer::countdown("A", 10)]);
        engine.focus_timer(0);
        engine.signal_start();
        assert!(engine.delete_timer("nope").is_none());
        assert!(!engine.state().active);
        assert_eq!(engine.state().focus, NO_FOCUS);
    }

    #[test]
    fn delete_removes_first_match_only() {
        let (mut engine, _clock) = engine_with(vec![
            Timer::countdown("Dup", 10),
            Timer::countdown("Dup", 20),
        ]);
        engine.delete_timer("Dup");
        assert_eq!(engine.state().timers.len(), 1);
        assert_eq!(engine.state().timers[0].total, 20);
    }

    #[test]
    fn edit_replaces_focused_timer() {
        let (mut engine, _clock) = engine_with(vec![Timer::countdown("Old", 10)]);
        engine.focus_timer(0);
        assert!(engine.edit_timer(Timer::countdown("New", 20)).is_some());
        assert_eq!(engine.state().timers[0].name, "New");
        assert_eq!(engine.state().timers[0].total, 20);
    }

    #[test]
    fn edit_without_focus_is_noop() {
        let (mut engine, _clock) = engine_with(vec![Timer::countdown("Old", 10)]);
        assert!(engine.edit_timer(Timer::countdown("New", 20)).is_none());
        assert_eq!(engine.state().timers[0].name, "Old");
    }

    #[test]
    fn add_and_edit_clamp_excess_delta() {
        let (mut engine, _clock) = engine_with(vec![]);
        let mut t = Timer::countdown("Broken", 10);
        t.delta = 99;
        engine.add_timer(t);
        assert_eq!(engine.state().timers[0].delta, 10);
    }

    #[test]
    fn count_next_steps_down_and_clamps() {
        let (mut engine, _clock) = engine_with(vec![Timer::counter("Pushups", 2)]);
        engine.focus_timer(0);
        assert!(matches!(
            engine.count_next(),
            Some(Event::CounterStepped { remaining: 1, .. })
        ));
        engine.count_next();
        assert_eq!(engine.state().timers[0].delta, 0);
        engine.count_next();
        assert_eq!(engine.state().timers[0].delta, 0);
    }

    #[test]
    fn count_next_rejects_wall_clock_timers() {
        let (mut engine, _clock) = engine_with(vec![Timer::countdown("Read", 10)]);
        engine.focus_timer(0);
        assert!(engine.count_next().is_none());
        assert_eq!(engine.state().timers[0].delta, 10);
    }

    #[test]
    fn overall_empty_state_is_zero_not_nan() {
        let (engine, _clock) = engine_with(vec![]);
        let overall = engine.overall();
        assert_eq!(overall.delta, 0.0);
        assert_eq!(overall.total, 0.0);
        assert_eq!(overall.percent(), 0);
    }

    #[test]
    fn overall_after_reset_is_zero() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Read", 100)]);
        engine.focus_timer(0);
        engine.signal_start();
        for _ in 0..40 {
            clock.advance_secs(1);
            engine.tick();
        }
        assert!(engine.overall().delta > 0.0);
        engine.signal_reset();
        assert_eq!(engine.overall().delta, 0.0);
        assert_eq!(engine.overall().total, 1.0);
    }

    #[test]
    fn overall_averages_across_timers() {
        let (mut engine, _clock) = engine_with(vec![
            Timer::countdown("Done", 100),
            Timer::countdown("Untouched", 100),
        ]);
        engine.state.timers[0].delta = 0;
        let overall = engine.overall();
        assert!((overall.delta - 0.5).abs() < 1e-9);
        assert_eq!(overall.total, 1.0);
    }

    #[test]
    fn cross_midnight_start_drops_notification() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Late", 60)]);
        // 30 seconds before local midnight.
        let near_midnight = NOON + 12 * 3_600_000 - 30_000;
        clock.set(near_midnight);
        engine.tick();
        engine.focus_timer(0);
        match engine.signal_start() {
            Some(Event::TimerStarted { notify_at, .. }) => assert!(notify_at.is_none()),
            other => panic!("expected TimerStarted, got {other:?}"),
        }
    }

    #[test]
    fn same_day_start_schedules_notification() {
        let (mut engine, _clock) = engine_with(vec![Timer::countdown("Read", 60)]);
        engine.focus_timer(0);
        match engine.signal_start() {
            Some(Event::TimerStarted { notify_at, .. }) => {
                assert_eq!(notify_at, Some(NOON + 60_000));
            }
            other => panic!("expected TimerStarted, got {other:?}"),
        }
    }

    #[test]
    fn rollover_saves_then_resets() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Read", 100)]);
        engine.focus_timer(0);
        engine.state.timers[0].delta = 25; // 75% done

        clock.advance_days(1);
        let event = engine.tick();
        match event {
            Some(Event::DayRolledOver {
                saves_appended,
                completion,
                ..
            }) => {
                assert_eq!(saves_appended, 1);
                assert_eq!(completion, 75);
            }
            other => panic!("expected DayRolledOver, got {other:?}"),
        }
        assert_eq!(engine.state().saves.len(), 1);
        assert_eq!(engine.state().saves[0].completion, 75);
        assert_eq!(engine.state().saves[0].date, NOON);
        assert_eq!(engine.state().timers[0].delta, 100);
        assert!(!engine.state().active);
    }

    #[test]
    fn rollover_backfills_missed_days_with_zero() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Read", 100)]);
        engine.state.timers[0].delta = 50;

        clock.advance_days(3);
        let event = engine.tick();
        match event {
            Some(Event::DayRolledOver { saves_appended, .. }) => assert_eq!(saves_appended, 3),
            other => panic!("expected DayRolledOver, got {other:?}"),
        }
        let saves = &engine.state().saves;
        assert_eq!(saves.len(), 3);
        assert_eq!(saves[0].completion, 50);
        assert_eq!(saves[1].completion, 0);
        assert_eq!(saves[2].completion, 0);
        assert_eq!(saves[1].date, NOON + MS_PER_DAY);
        assert_eq!(saves[2].date, NOON + 2 * MS_PER_DAY);
    }

    #[test]
    fn catch_up_subtracts_offline_seconds() {
        let clock = Arc::new(ManualClock::new(NOON + 90_000));
        let mut state = State::new(NOON);
        state.timers.push(Timer::countdown("Read", 600));
        state.focus = 0;
        state.active = true;

        let mut engine = TimerEngine::with_state(state, clock);
        let event = engine.catch_up();
        assert!(matches!(
            event,
            Some(Event::ElapsedReconciled {
                recovered_secs: 90,
                ..
            })
        ));
        assert_eq!(engine.state().timers[0].delta, 510);
        assert!(engine.state().active);
    }

    #[test]
    fn catch_up_clamps_at_zero() {
        let clock = Arc::new(ManualClock::new(NOON + 10_000_000));
        let mut state = State::new(NOON);
        state.timers.push(Timer::countdown("Read", 600));
        state.focus = 0;
        state.active = true;

        let mut engine = TimerEngine::with_state(state, clock);
        engine.catch_up();
        assert_eq!(engine.state().timers[0].delta, 0);
    }

    #[test]
    fn catch_up_rolls_over_across_days() {
        let clock = Arc::new(ManualClock::new(NOON + MS_PER_DAY));
        let mut state = State::new(NOON);
        state.timers.push(Timer::countdown("Read", 100));
        state.timers[0].delta = 30;
        state.active = true;
        state.focus = 0;

        let mut engine = TimerEngine::with_state(state, clock);
        let event = engine.catch_up();
        assert!(matches!(event, Some(Event::DayRolledOver { .. })));
        assert_eq!(engine.state().saves.len(), 1);
        assert_eq!(engine.state().saves[0].completion, 70);
        assert_eq!(engine.state().timers[0].delta, 100);
    }

    #[test]
    fn catch_up_runs_only_once() {
        let clock = Arc::new(ManualClock::new(NOON + 90_000));
        let mut state = State::new(NOON);
        state.timers.push(Timer::countdown("Read", 600));
        state.focus = 0;
        state.active = true;

        let mut engine = TimerEngine::with_state(state, clock);
        assert!(engine.catch_up().is_some());
        assert!(engine.catch_up().is_none());
        assert_eq!(engine.state().timers[0].delta, 510);
    }

    #[test]
    fn catch_up_idle_same_day_adopts_state_as_is() {
        let clock = Arc::new(ManualClock::new(NOON + 90_000));
        let mut state = State::new(NOON);
        state.timers.push(Timer::countdown("Read", 600));

        let mut engine = TimerEngine::with_state(state, clock);
        assert!(engine.catch_up().is_none());
        assert_eq!(engine.state().timers[0].delta, 600);
        assert_eq!(engine.state().date, NOON + 90_000);
    }

    #[test]
    fn clear_saves_empties_history() {
        let (mut engine, clock) = engine_with(vec![Timer::countdown("Read", 100)]);
        clock.advance_days(1);
        engine.tick();
        assert!(!engine.state().saves.is_empty());
        engine.clear_saves();
        assert!(engine.state().saves.is_empty());
    }

    #[test]
    fn reset_all_winds_every_timer_back() {
        let (mut engine, _clock) = engine_with(vec![
            Timer::countdown("A", 10),
            Timer::counter("B", 5),
        ]);
        engine.state.timers[0].delta = 3;
        engine.state.timers[1].delta = 1;
        engine.reset_all_timers();
        assert_eq!(engine.state().timers[0].delta, 10);
        assert_eq!(engine.state().timers[1].delta, 5);
    }
}
