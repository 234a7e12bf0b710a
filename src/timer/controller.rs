//! Async tick driver for the timer engine.
//!
//! `TimerController` owns the one periodic tick task of a timer instance.
//! The task is spawned when the countdown starts and aborted whenever the
//! engine leaves Running, so no tick can land after `pause`, `stop` or
//! `reset` return.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use crate::observer::Subscription;
use crate::types::{TimerMode, TimerSnapshot};

use super::engine::{TerminalRun, TimerEngine};

/// Nominal tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Drives a `TimerEngine` from a tokio interval.
pub struct TimerController {
    engine: Arc<Mutex<TimerEngine>>,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
    tick_period: Duration,
}

impl TimerController {
    /// Wraps an engine. No task is spawned until `start`.
    pub fn new(engine: TimerEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: std::sync::Mutex::new(None),
            tick_period: TICK_PERIOD,
        }
    }

    /// Overrides the tick period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Shared handle to the engine.
    pub fn engine(&self) -> Arc<Mutex<TimerEngine>> {
        Arc::clone(&self.engine)
    }

    /// Starts or resumes the countdown and spawns the tick task.
    pub async fn start(&self) -> bool {
        let epoch = {
            let mut engine = self.engine.lock().await;
            if !engine.start() {
                return false;
            }
            engine.epoch()
        };
        self.spawn_ticker(epoch);
        true
    }

    /// Pauses the countdown and cancels the tick task.
    pub async fn pause(&self) -> bool {
        let paused = self.engine.lock().await.pause();
        if paused {
            self.cancel_ticker();
        }
        paused
    }

    /// Stops the run; returns the run handed off for recording, if any.
    pub async fn stop(&self) -> Option<TerminalRun> {
        let run = self.engine.lock().await.stop();
        self.cancel_ticker();
        run
    }

    /// Resets to Idle and cancels the tick task.
    pub async fn reset(&self) {
        self.engine.lock().await.reset();
        self.cancel_ticker();
    }

    /// Changes the duration (implicit reset during a run).
    pub async fn set_duration(&self, minutes: u32) {
        self.engine.lock().await.set_duration(minutes);
        self.cancel_ticker();
    }

    /// Switches mode (implicit reset during a run).
    pub async fn set_mode(&self, mode: TimerMode, minutes: Option<u32>) {
        self.engine.lock().await.set_mode(mode, minutes);
        self.cancel_ticker();
    }

    /// Current observer view.
    pub async fn snapshot(&self) -> TimerSnapshot {
        self.engine.lock().await.snapshot()
    }

    /// Registers an observer on the engine.
    pub async fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&TimerSnapshot) + Send + Sync + 'static,
    {
        self.engine.lock().await.subscribe(callback)
    }

    /// Returns true while a tick task is alive.
    pub fn is_ticking(&self) -> bool {
        self.lock_ticker()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels the tick task. Call before dropping the controller.
    pub async fn shutdown(&self) {
        self.cancel_ticker();
    }

    fn spawn_ticker(&self, epoch: u64) {
        let engine = Arc::clone(&self.engine);
        let period = self.tick_period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let mut engine = engine.lock().await;
                if engine.epoch() != epoch || !engine.state().is_running() {
                    break;
                }
                if engine.tick() {
                    break;
                }
            }
            debug!(epoch, "tick task finished");
        });

        if let Some(previous) = self.lock_ticker().replace(handle) {
            previous.abort();
        }
    }

    fn cancel_ticker(&self) {
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
        }
    }

    fn lock_ticker(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

// ============================================================================
// Tests
// ============================================================================
