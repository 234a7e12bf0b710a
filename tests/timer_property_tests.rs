//! Property tests for the timer engine and tick driver.
//!
//! These tests pin down the countdown contract end to end:
//! - Completion after exactly `minutes * 60` ticks
//! - Pause/resume keeps the run's start time and remaining seconds
//! - Reset from any phase returns to a fresh Idle state
//! - Progress is monotonic and bounded
//! - Stopped and completed runs are handed off at most once
//! - No tick lands after a stop

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::mpsc;

use focusflow::timer::{MockClock, TerminalRun, TimerController, TimerEngine, TimerEvent};
use focusflow::types::{TimerMode, TimerPhase};

// ============================================================================
// Test Helpers
// ============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

/// Creates an idle engine on a manual clock.
fn create_engine(
    minutes: u32,
) -> (TimerEngine, Arc<MockClock>, mpsc::UnboundedReceiver<TimerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let clock = Arc::new(MockClock::new(t0()));
    let engine = TimerEngine::with_clock(TimerMode::Custom, minutes, clock.clone(), tx);
    (engine, clock, rx)
}

/// Advances the clock by one second and ticks.
fn tick_second(engine: &mut TimerEngine, clock: &MockClock) -> bool {
    clock.advance(Duration::seconds(1));
    engine.tick()
}

/// Collects the runs handed off so far.
fn drain_runs(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TerminalRun> {
    let mut runs = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            TimerEvent::Completed(run) | TimerEvent::Stopped(Some(run)) => runs.push(run),
            _ => {}
        }
    }
    runs
}

// ============================================================================
// Countdown
// ============================================================================

mod countdown {
    use super::*;

    #[test]
    fn test_completes_after_exactly_minutes_times_sixty_ticks() {
        for minutes in [1, 2, 25, 50, 180] {
            let (mut engine, _clock, _rx) = create_engine(minutes);
            assert!(engine.start());
            assert_eq!(engine.state().phase, TimerPhase::Running);

            let ticks = minutes * 60;
            for i in 1..ticks {
                assert!(!engine.tick(), "completed early at tick {} of {}", i, ticks);
            }
            assert!(engine.tick());

            assert_eq!(engine.state().phase, TimerPhase::Completed);
            assert_eq!(engine.state().remaining_seconds, 0);
        }
    }

    #[test]
    fn test_pause_and_resume_keep_start_time_and_remaining() {
        let (mut engine, clock, _rx) = create_engine(25);
        engine.start();
        for _ in 0..90 {
            tick_second(&mut engine, &clock);
        }
        let started_at = engine.state().started_at;
        let remaining = engine.state().remaining_seconds;

        assert!(engine.pause());
        clock.advance(Duration::minutes(5));
        assert!(engine.start());

        assert_eq!(engine.state().phase, TimerPhase::Running);
        assert_eq!(engine.state().started_at, started_at);
        assert_eq!(engine.state().remaining_seconds, remaining);
    }

    #[test]
    fn test_reset_from_any_phase_returns_to_fresh_idle() {
        let phases: [fn(&mut TimerEngine, &MockClock); 4] = [
            |_, _| {},
            |e, c| {
                e.start();
                tick_second(e, c);
            },
            |e, c| {
                e.start();
                tick_second(e, c);
                e.pause();
            },
            |e, c| {
                e.start();
                while !tick_second(e, c) {}
            },
        ];

        for drive in phases {
            let (mut engine, clock, _rx) = create_engine(1);
            drive(&mut engine, &clock);

            engine.reset();

            let state = engine.state();
            assert_eq!(state.phase, TimerPhase::Idle);
            assert_eq!(state.remaining_seconds, state.total_duration_seconds);
            assert_eq!(state.started_at, None);
        }
    }

    #[test]
    fn test_progress_is_monotonic_and_bounded() {
        let (mut engine, clock, _rx) = create_engine(2);
        engine.start();

        let mut previous = engine.snapshot().progress;
        assert_eq!(previous, 0.0);
        loop {
            let done = tick_second(&mut engine, &clock);
            let progress = engine.snapshot().progress;
            assert!((0.0..=100.0).contains(&progress));
            assert!(progress >= previous);
            previous = progress;
            if done {
                break;
            }
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_display_has_no_hour_component() {
        let (engine, _clock, _rx) = create_engine(180);
        assert_eq!(engine.snapshot().display, "180:00");
    }
}

// ============================================================================
// Hand-off
// ============================================================================

mod hand_off {
    use super::*;

    #[test]
    fn test_stop_after_seven_and_a_half_minutes_floors_to_seven() {
        let (mut engine, clock, mut rx) = create_engine(25);
        engine.start();
        clock.advance(Duration::seconds(7 * 60 + 30));

        let run = engine.stop().expect("run handed off");

        assert_eq!(run.actual_minutes(), 7);
        assert!(!run.completed);
        assert_eq!(run.started_at, t0());
        assert_eq!(drain_runs(&mut rx), vec![run]);
        assert_eq!(engine.state().phase, TimerPhase::Idle);
    }

    #[test]
    fn test_stop_before_a_full_minute_hands_off_nothing() {
        let (mut engine, clock, mut rx) = create_engine(25);
        engine.start();
        clock.advance(Duration::seconds(59));

        assert_eq!(engine.stop(), None);
        assert!(drain_runs(&mut rx).is_empty());
    }

    #[test]
    fn test_natural_completion_hands_off_exactly_one_run() {
        let (mut engine, clock, mut rx) = create_engine(25);
        engine.start();
        while !tick_second(&mut engine, &clock) {}

        // late ticks and a stop after completion add nothing
        engine.tick();
        engine.tick();
        assert_eq!(engine.stop(), None);

        let runs = drain_runs(&mut rx);
        assert_eq!(runs.len(), 1);
        assert!(runs[0].completed);
        assert_eq!(runs[0].actual_minutes(), 25);
        assert_eq!(runs[0].planned_minutes, 25);
    }

    #[test]
    fn test_every_new_run_gets_its_own_hand_off() {
        let (mut engine, clock, mut rx) = create_engine(1);

        for _ in 0..3 {
            engine.reset();
            engine.start();
            while !tick_second(&mut engine, &clock) {}
        }

        assert_eq!(drain_runs(&mut rx).len(), 3);
    }

    #[test]
    fn test_set_duration_mid_run_is_an_implicit_reset() {
        let (mut engine, clock, mut rx) = create_engine(25);
        engine.start();
        clock.advance(Duration::minutes(10));

        engine.set_duration(50);

        assert_eq!(engine.state().phase, TimerPhase::Idle);
        assert_eq!(engine.state().total_duration_seconds, 50 * 60);
        assert_eq!(engine.state().started_at, None);
        assert!(drain_runs(&mut rx).is_empty());
    }
}

// ============================================================================
// Tick driver
// ============================================================================

mod tick_driver {
    use super::*;
    use tokio::time::{sleep, Duration as TokioDuration};

    fn create_controller(minutes: u32) -> (TimerController, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TimerController::new(TimerEngine::new(TimerMode::Custom, minutes, tx)), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_zombie_tick_after_stop() {
        let (controller, _rx) = create_controller(25);
        controller.start().await;
        sleep(TokioDuration::from_millis(3200)).await;

        controller.stop().await;
        let after_stop = controller.snapshot().await;
        sleep(TokioDuration::from_secs(30)).await;

        assert_eq!(controller.snapshot().await, after_stop);
        assert!(!controller.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_zombie_tick_after_reset_while_paused() {
        let (controller, _rx) = create_controller(25);
        controller.start().await;
        sleep(TokioDuration::from_millis(1500)).await;
        controller.pause().await;

        controller.reset().await;
        sleep(TokioDuration::from_secs(10)).await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, TimerPhase::Idle);
        assert_eq!(snapshot.remaining_seconds, 25 * 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop_ticks_once_per_period() {
        let (controller, _rx) = create_controller(25);
        controller.start().await;
        sleep(TokioDuration::from_millis(1500)).await;
        controller.stop().await;

        controller.start().await;
        sleep(TokioDuration::from_millis(2500)).await;

        assert_eq!(controller.snapshot().await.remaining_seconds, 25 * 60 - 2);
    }
}
