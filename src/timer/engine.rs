//! Timer engine for the focus timer.
//!
//! This module provides the countdown state machine:
//! - Phase transitions (Idle → Running ⇄ Paused → Idle, Running → Completed)
//! - One-second decrements driven by an external tick source
//! - Event firing for session recording and notifications
//! - Exactly-once hand-off of each terminated run

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

use crate::observer::{Subscribers, Subscription};
use crate::types::{
    whole_minutes_between, FocusSessionInput, TimerMode, TimerPhase, TimerSnapshot, TimerState,
};

use super::clock::{Clock, SystemClock};

// ============================================================================
// TerminalRun
// ============================================================================

/// A run that ended, either naturally or by a manual stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalRun {
    pub mode: TimerMode,
    pub planned_minutes: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
}

impl TerminalRun {
    /// Whole minutes between start and end, floored.
    pub fn actual_minutes(&self) -> u32 {
        whole_minutes_between(self.started_at, self.ended_at)
    }

    /// Builds the session record for `user_id`.
    pub fn to_session(&self, user_id: &str) -> FocusSessionInput {
        FocusSessionInput {
            user_id: user_id.to_string(),
            planned_minutes: self.planned_minutes,
            actual_minutes: self.actual_minutes(),
            mode: self.mode,
            started_at: self.started_at,
            ended_at: self.ended_at,
            completed: self.completed,
        }
    }
}

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for session recording and notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown entered Running
    Started {
        /// False when resuming a paused run
        new_run: bool,
    },
    /// Countdown suspended
    Paused,
    /// One second elapsed
    Tick {
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// Countdown reached zero
    Completed(TerminalRun),
    /// Run stopped manually; carries the run if it lasted at least a minute
    Stopped(Option<TerminalRun>),
    /// Timer returned to Idle without recording anything
    Reset,
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Single-instance countdown with explicit phase transitions.
///
/// All control operations are total: a transition that does not apply in the
/// current phase is a no-op and reports `false`/`None`.
pub struct TimerEngine {
    state: TimerState,
    clock: Arc<dyn Clock>,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
    observers: Subscribers<TimerSnapshot>,
    /// Set once the current run has been handed off; cleared on the next run.
    run_recorded: bool,
    /// Bumped whenever the countdown stops being driven, so stale tick
    /// sources can tell they no longer apply.
    epoch: u64,
}

impl TimerEngine {
    /// Creates an idle engine using the system clock.
    pub fn new(mode: TimerMode, minutes: u32, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self::with_clock(mode, minutes, Arc::new(SystemClock), event_tx)
    }

    /// Creates an idle engine reading time from `clock`.
    pub fn with_clock(
        mode: TimerMode,
        minutes: u32,
        clock: Arc<dyn Clock>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self {
            state: TimerState::new(mode, minutes),
            clock,
            event_tx,
            observers: Subscribers::new(),
            run_recorded: false,
            epoch: 0,
        }
    }

    /// Starts a new run from Idle or resumes from Paused.
    pub fn start(&mut self) -> bool {
        let now = self.clock.now();
        let Some(new_run) = self.state.start(now) else {
            debug!(phase = self.state.phase.as_str(), "start ignored");
            return false;
        };
        if new_run {
            self.run_recorded = false;
        }
        self.epoch += 1;

        self.emit(TimerEvent::Started { new_run });
        self.publish();
        true
    }

    /// Pauses a running countdown.
    pub fn pause(&mut self) -> bool {
        if !self.state.pause() {
            debug!(phase = self.state.phase.as_str(), "pause ignored");
            return false;
        }
        self.epoch += 1;

        self.emit(TimerEvent::Paused);
        self.publish();
        true
    }

    /// Stops the current run and returns to Idle.
    ///
    /// If at least one whole minute elapsed since the run started, the run is
    /// handed off as an incomplete session and also returned. Stopping a
    /// completed timer behaves like `reset`.
    pub fn stop(&mut self) -> Option<TerminalRun> {
        match self.state.phase {
            TimerPhase::Idle => {
                debug!("stop ignored while idle");
                return None;
            }
            TimerPhase::Completed => {
                self.reset();
                return None;
            }
            TimerPhase::Running | TimerPhase::Paused => {}
        }

        let now = self.clock.now();
        let run = match self.state.started_at {
            Some(started_at)
                if !self.run_recorded && whole_minutes_between(started_at, now) > 0 =>
            {
                self.run_recorded = true;
                Some(TerminalRun {
                    mode: self.state.mode,
                    planned_minutes: self.state.planned_minutes(),
                    started_at,
                    ended_at: now,
                    completed: false,
                })
            }
            _ => None,
        };

        self.state.reset();
        self.epoch += 1;

        self.emit(TimerEvent::Stopped(run.clone()));
        self.publish();
        run
    }

    /// Returns to Idle from any phase without recording anything.
    pub fn reset(&mut self) {
        self.state.reset();
        self.epoch += 1;

        self.emit(TimerEvent::Reset);
        self.publish();
    }

    /// Applies one tick. Returns true if this tick completed the run.
    ///
    /// Ticks outside Running are ignored, which keeps a late tick from
    /// mutating state after a pause, stop or reset.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }

        let completed = self.state.tick();
        self.emit(TimerEvent::Tick {
            remaining_seconds: self.state.remaining_seconds,
        });

        if completed {
            self.epoch += 1;
            self.handle_timer_complete();
        }

        self.publish();
        completed
    }

    /// Hands off a naturally completed run, at most once per run.
    fn handle_timer_complete(&mut self) {
        if self.run_recorded {
            debug!("completion already recorded for this run");
            return;
        }
        let Some(started_at) = self.state.started_at else {
            return;
        };
        self.run_recorded = true;

        self.emit(TimerEvent::Completed(TerminalRun {
            mode: self.state.mode,
            planned_minutes: self.state.planned_minutes(),
            started_at,
            ended_at: self.clock.now(),
            completed: true,
        }));
    }

    /// Changes the run duration (clamped to 1-180 minutes).
    ///
    /// Called during a run this is an implicit reset: the open run is
    /// discarded without emitting a session.
    pub fn set_duration(&mut self, minutes: u32) {
        if self.state.phase.is_in_run() {
            debug!("duration changed mid-run, resetting");
        }
        self.state.set_duration(minutes);
        self.epoch += 1;

        self.emit(TimerEvent::Reset);
        self.publish();
    }

    /// Switches mode, using the mode's preset unless `minutes` is given.
    pub fn set_mode(&mut self, mode: TimerMode, minutes: Option<u32>) {
        self.state.mode = mode;
        self.set_duration(minutes.unwrap_or_else(|| mode.default_minutes()));
    }

    /// Registers an observer; it receives the current snapshot immediately.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&TimerSnapshot) + Send + Sync + 'static,
    {
        self.observers.subscribe(&self.snapshot(), callback)
    }

    /// Returns a reference to the current timer state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Returns an observer view of the current state.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(&self.state)
    }

    /// Generation counter for tick sources.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut TimerState {
        &mut self.state
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("timer event dropped, no receiver");
        }
    }

    fn publish(&self) {
        self.observers.notify(&self.snapshot());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::MockClock;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn create_engine(
        minutes: u32,
    ) -> (TimerEngine, Arc<MockClock>, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = Arc::new(MockClock::new(t0()));
        let engine = TimerEngine::with_clock(TimerMode::Pomodoro, minutes, clock.clone(), tx);
        (engine, clock, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn terminal_events(events: &[TimerEvent]) -> Vec<&TimerEvent> {
        events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Completed(_) | TimerEvent::Stopped(Some(_))))
            .collect()
    }

    // ------------------------------------------------------------------------
    // TerminalRun Tests
    // ------------------------------------------------------------------------

    mod terminal_run_tests {
        use super::*;

        #[test]
        fn test_actual_minutes_floors() {
            let run = TerminalRun {
                mode: TimerMode::Pomodoro,
                planned_minutes: 25,
                started_at: t0(),
                ended_at: t0() + Duration::seconds(7 * 60 + 59),
                completed: false,
            };
            assert_eq!(run.actual_minutes(), 7);
        }

        #[test]
        fn test_to_session() {
            let run = TerminalRun {
                mode: TimerMode::DeepFocus,
                planned_minutes: 50,
                started_at: t0(),
                ended_at: t0() + Duration::minutes(30),
                completed: false,
            };
            let session = run.to_session("user-1");
            assert_eq!(session.user_id, "user-1");
            assert_eq!(session.planned_minutes, 50);
            assert_eq!(session.actual_minutes, 30);
            assert_eq!(session.mode, TimerMode::DeepFocus);
            assert!(!session.completed);
        }
    }

    // ------------------------------------------------------------------------
    // TimerEngine Tests
    // ------------------------------------------------------------------------

    mod timer_engine_tests {
        use super::*;

        #[test]
        fn test_new_engine() {
            let (engine, _clock, _rx) = create_engine(25);
            let state = engine.state();

            assert_eq!(state.phase, TimerPhase::Idle);
            assert_eq!(state.remaining_seconds, 25 * 60);
            assert!(state.started_at.is_none());
        }

        #[test]
        fn test_start() {
            let (mut engine, _clock, mut rx) = create_engine(25);

            assert!(engine.start());

            assert_eq!(engine.state().phase, TimerPhase::Running);
            assert_eq!(engine.state().started_at, Some(t0()));
            assert_eq!(rx.try_recv().unwrap(), TimerEvent::Started { new_run: true });
        }

        #[test]
        fn test_start_while_running_is_noop() {
            let (mut engine, _clock, mut rx) = create_engine(25);
            engine.start();
            let _ = rx.try_recv();

            assert!(!engine.start());
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_pause_and_resume_keep_started_at() {
            let (mut engine, clock, mut rx) = create_engine(25);
            engine.start();
            for _ in 0..30 {
                engine.tick();
            }
            clock.advance(Duration::seconds(30));

            assert!(engine.pause());
            assert_eq!(engine.state().phase, TimerPhase::Paused);
            let remaining = engine.state().remaining_seconds;

            clock.advance(Duration::minutes(5));
            assert!(engine.start());

            assert_eq!(engine.state().phase, TimerPhase::Running);
            assert_eq!(engine.state().started_at, Some(t0()));
            assert_eq!(engine.state().remaining_seconds, remaining);

            let events = drain(&mut rx);
            assert!(events.contains(&TimerEvent::Paused));
            assert!(events.contains(&TimerEvent::Started { new_run: false }));
        }

        #[test]
        fn test_pause_not_running_is_noop() {
            let (mut engine, _clock, _rx) = create_engine(25);
            assert!(!engine.pause());
            assert_eq!(engine.state().phase, TimerPhase::Idle);
        }

        #[test]
        fn test_tick_decrements_by_one() {
            let (mut engine, _clock, mut rx) = create_engine(25);
            engine.start();
            let _ = rx.try_recv();

            assert!(!engine.tick());

            assert_eq!(engine.state().remaining_seconds, 25 * 60 - 1);
            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Tick {
                    remaining_seconds: 25 * 60 - 1
                }
            );
        }

        #[test]
        fn test_tick_ignored_when_not_running() {
            let (mut engine, _clock, mut rx) = create_engine(25);

            assert!(!engine.tick());
            assert_eq!(engine.state().remaining_seconds, 25 * 60);

            engine.start();
            engine.pause();
            let _ = drain(&mut rx);

            assert!(!engine.tick());
            assert_eq!(engine.state().remaining_seconds, 25 * 60);
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_natural_completion_emits_once() {
            let (mut engine, clock, mut rx) = create_engine(1);
            engine.start();

            for _ in 0..59 {
                assert!(!engine.tick());
                clock.advance(Duration::seconds(1));
            }
            clock.advance(Duration::seconds(1));
            assert!(engine.tick());

            assert_eq!(engine.state().phase, TimerPhase::Completed);
            assert_eq!(engine.state().remaining_seconds, 0);

            // further ticks and stops must not hand the run off again
            assert!(!engine.tick());
            assert!(engine.stop().is_none());

            let events = drain(&mut rx);
            let terminal = terminal_events(&events);
            assert_eq!(terminal.len(), 1);
            match terminal[0] {
                TimerEvent::Completed(run) => {
                    assert!(run.completed);
                    assert_eq!(run.actual_minutes(), 1);
                    assert_eq!(run.planned_minutes, 1);
                }
                other => panic!("Expected Completed, got {:?}", other),
            }
        }

        #[test]
        fn test_completion_guard_survives_forced_tick() {
            let (mut engine, _clock, mut rx) = create_engine(1);
            engine.start();
            engine.state_mut().remaining_seconds = 1;
            assert!(engine.tick());

            // force the phase back to running with time left, as a stray
            // double-completion path would
            engine.state_mut().phase = TimerPhase::Running;
            engine.state_mut().remaining_seconds = 1;
            assert!(engine.tick());

            let events = drain(&mut rx);
            assert_eq!(terminal_events(&events).len(), 1);
        }

        #[test]
        fn test_stop_with_progress_emits_incomplete_session() {
            let (mut engine, clock, mut rx) = create_engine(25);
            engine.start();
            clock.advance(Duration::seconds(7 * 60 + 30));

            let run = engine.stop().expect("run should be handed off");

            assert_eq!(run.actual_minutes(), 7);
            assert!(!run.completed);
            assert_eq!(engine.state().phase, TimerPhase::Idle);
            assert_eq!(engine.state().remaining_seconds, 25 * 60);
            assert!(engine.state().started_at.is_none());

            let events = drain(&mut rx);
            assert!(events.contains(&TimerEvent::Stopped(Some(run))));
        }

        #[test]
        fn test_stop_under_a_minute_emits_nothing() {
            let (mut engine, clock, mut rx) = create_engine(25);
            engine.start();
            clock.advance(Duration::seconds(59));

            assert!(engine.stop().is_none());

            let events = drain(&mut rx);
            assert!(events.contains(&TimerEvent::Stopped(None)));
            assert!(terminal_events(&events).is_empty());
        }

        #[test]
        fn test_stop_from_paused() {
            let (mut engine, clock, _rx) = create_engine(25);
            engine.start();
            clock.advance(Duration::minutes(3));
            engine.pause();

            let run = engine.stop().unwrap();
            assert_eq!(run.actual_minutes(), 3);
            assert_eq!(engine.state().phase, TimerPhase::Idle);
        }

        #[test]
        fn test_stop_while_idle_is_noop() {
            let (mut engine, _clock, mut rx) = create_engine(25);
            assert!(engine.stop().is_none());
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_reset_from_completed() {
            let (mut engine, _clock, _rx) = create_engine(1);
            engine.start();
            engine.state_mut().remaining_seconds = 1;
            engine.tick();

            engine.reset();

            assert_eq!(engine.state().phase, TimerPhase::Idle);
            assert_eq!(engine.state().remaining_seconds, 60);
            assert!(engine.state().started_at.is_none());
        }

        #[test]
        fn test_new_run_after_reset_can_record_again() {
            let (mut engine, clock, mut rx) = create_engine(1);
            for _ in 0..2 {
                engine.start();
                clock.advance(Duration::minutes(1));
                for _ in 0..60 {
                    engine.tick();
                }
                engine.reset();
            }
            let events = drain(&mut rx);
            assert_eq!(terminal_events(&events).len(), 2);
        }

        #[test]
        fn test_set_duration_mid_run_is_implicit_reset() {
            let (mut engine, clock, mut rx) = create_engine(25);
            engine.start();
            clock.advance(Duration::minutes(10));

            engine.set_duration(50);

            assert_eq!(engine.state().phase, TimerPhase::Idle);
            assert_eq!(engine.state().total_duration_seconds, 3000);
            assert_eq!(engine.state().remaining_seconds, 3000);
            let events = drain(&mut rx);
            assert!(terminal_events(&events).is_empty());
        }

        #[test]
        fn test_set_duration_clamps() {
            let (mut engine, _clock, _rx) = create_engine(25);
            engine.set_duration(0);
            assert_eq!(engine.state().total_duration_seconds, 60);
            engine.set_duration(999);
            assert_eq!(engine.state().total_duration_seconds, 180 * 60);
        }

        #[test]
        fn test_set_mode_uses_preset() {
            let (mut engine, _clock, _rx) = create_engine(25);
            engine.set_mode(TimerMode::DeepFocus, None);
            assert_eq!(engine.state().mode, TimerMode::DeepFocus);
            assert_eq!(engine.state().total_duration_seconds, 50 * 60);

            engine.set_mode(TimerMode::Custom, Some(42));
            assert_eq!(engine.state().total_duration_seconds, 42 * 60);
        }

        #[test]
        fn test_epoch_bumps_on_transitions() {
            let (mut engine, _clock, _rx) = create_engine(25);
            let e0 = engine.epoch();
            engine.start();
            let e1 = engine.epoch();
            engine.tick();
            assert_eq!(engine.epoch(), e1);
            engine.pause();
            assert!(engine.epoch() > e1);
            assert!(e1 > e0);
        }

        #[test]
        fn test_subscribe_receives_initial_and_updates() {
            let (mut engine, _clock, _rx) = create_engine(25);
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);

            let sub = engine.subscribe(move |s| sink.lock().unwrap().push(s.phase));
            engine.start();
            engine.pause();
            sub.unsubscribe();
            engine.reset();

            assert_eq!(
                *seen.lock().unwrap(),
                vec![TimerPhase::Idle, TimerPhase::Running, TimerPhase::Paused]
            );
        }

        #[test]
        fn test_dropped_receiver_does_not_break_engine() {
            let (mut engine, _clock, rx) = create_engine(1);
            drop(rx);
            assert!(engine.start());
            assert!(!engine.tick());
            assert!(engine.pause());
        }
    }
}
