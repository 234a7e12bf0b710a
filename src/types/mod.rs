//! Core data types for the focus timer.
//!
//! This module defines the data structures used for:
//! - Timer phase, mode and countdown state
//! - Focus session records handed to persistence
//! - Derived history projections (stats and chart points)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Shortest duration a run can be configured with, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 1;

/// Longest duration a run can be configured with, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 180;

/// Prefix of locally synthesized session ids.
pub const OFFLINE_ID_PREFIX: &str = "offline-";

// ============================================================================
// TimerPhase
// ============================================================================

/// Represents the current phase of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Not started, or reset
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Countdown suspended, run still open
    Paused,
    /// Countdown reached zero
    Completed,
}

impl TimerPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Completed => "completed",
        }
    }

    /// Returns true if the timer is actively counting down.
    pub fn is_active(&self) -> bool {
        matches!(self, TimerPhase::Running)
    }

    /// Returns true while a run is open (started and not yet terminated).
    pub fn is_in_run(&self) -> bool {
        matches!(self, TimerPhase::Running | TimerPhase::Paused)
    }
}

// ============================================================================
// TimerMode
// ============================================================================

/// Selectable timer presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerMode {
    /// Classic 25 minute pomodoro
    #[default]
    Pomodoro,
    /// 50 minute deep work block
    DeepFocus,
    /// User-chosen duration
    Custom,
}

impl TimerMode {
    /// All modes in display order.
    pub const ALL: [TimerMode; 3] = [TimerMode::Pomodoro, TimerMode::DeepFocus, TimerMode::Custom];

    /// Returns the wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Pomodoro => "pomodoro",
            TimerMode::DeepFocus => "deep-focus",
            TimerMode::Custom => "custom",
        }
    }

    /// Returns the preset duration of the mode in minutes.
    pub fn default_minutes(&self) -> u32 {
        match self {
            TimerMode::Pomodoro => 25,
            TimerMode::DeepFocus => 50,
            TimerMode::Custom => 30,
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pomodoro" => Ok(TimerMode::Pomodoro),
            "deep-focus" | "deep_focus" | "deepfocus" => Ok(TimerMode::DeepFocus),
            "custom" => Ok(TimerMode::Custom),
            other => Err(format!(
                "unknown mode '{}' (expected pomodoro, deep-focus or custom)",
                other
            )),
        }
    }
}

// ============================================================================
// Duration helpers
// ============================================================================

/// Clamps a duration in minutes to the valid range.
pub fn clamp_minutes(minutes: i64) -> u32 {
    minutes.clamp(MIN_DURATION_MINUTES as i64, MAX_DURATION_MINUTES as i64) as u32
}

/// Parses free-form duration input, clamping instead of rejecting.
///
/// Non-numeric input maps to the minimum duration.
pub fn parse_minutes(input: &str) -> u32 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => clamp_minutes(value.floor() as i64),
        _ => MIN_DURATION_MINUTES,
    }
}

/// Formats seconds as `MM:SS`. Minutes are never folded into hours.
pub fn format_time(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Percentage of the run already elapsed, clamped to `[0, 100]`.
pub fn progress_percent(total_seconds: u32, remaining_seconds: u32) -> f64 {
    if total_seconds == 0 {
        return 0.0;
    }
    let elapsed = total_seconds.saturating_sub(remaining_seconds) as f64;
    (elapsed / total_seconds as f64 * 100.0).clamp(0.0, 100.0)
}

/// Whole minutes between two instants, floored and never negative.
pub fn whole_minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis / 60_000).min(u32::MAX as i64) as u32
}

// ============================================================================
// TimerState
// ============================================================================

/// Countdown state owned by a single timer engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    /// Current phase of the timer
    pub phase: TimerPhase,
    /// Selected preset
    pub mode: TimerMode,
    /// Configured duration of a run
    pub total_duration_seconds: u32,
    /// Seconds left in the current run
    pub remaining_seconds: u32,
    /// First transition into Running of the current run
    pub started_at: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Creates an idle state for the given mode and duration.
    pub fn new(mode: TimerMode, minutes: u32) -> Self {
        let total = clamp_minutes(minutes as i64) * 60;
        Self {
            phase: TimerPhase::Idle,
            mode,
            total_duration_seconds: total,
            remaining_seconds: total,
            started_at: None,
        }
    }

    /// Enters Running from Idle or Paused.
    ///
    /// Returns `Some(true)` when a new run began, `Some(false)` on resume,
    /// and `None` if the phase does not allow starting.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<bool> {
        match self.phase {
            TimerPhase::Idle => {
                self.phase = TimerPhase::Running;
                let new_run = self.started_at.is_none();
                if new_run {
                    self.started_at = Some(now);
                }
                Some(new_run)
            }
            TimerPhase::Paused => {
                self.phase = TimerPhase::Running;
                Some(false)
            }
            TimerPhase::Running | TimerPhase::Completed => None,
        }
    }

    /// Suspends a running countdown. Returns false if not running.
    pub fn pause(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.phase = TimerPhase::Paused;
        true
    }

    /// Returns to Idle with a full countdown and no run open.
    pub fn reset(&mut self) {
        self.phase = TimerPhase::Idle;
        self.remaining_seconds = self.total_duration_seconds;
        self.started_at = None;
    }

    /// Changes the configured duration. Any open run is discarded.
    pub fn set_duration(&mut self, minutes: u32) {
        self.total_duration_seconds = clamp_minutes(minutes as i64) * 60;
        self.reset();
    }

    /// Decrements the countdown by one second.
    ///
    /// Only applies while Running. Returns true if this tick completed the run.
    pub fn tick(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.phase = TimerPhase::Completed;
            return true;
        }
        false
    }

    /// Configured duration in whole minutes.
    pub fn planned_minutes(&self) -> u32 {
        self.total_duration_seconds / 60
    }

    /// Whole minutes elapsed since the run started (0 if not started).
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u32 {
        self.started_at
            .map(|started| whole_minutes_between(started, now))
            .unwrap_or(0)
    }

    /// Progress of the current run in percent.
    pub fn progress(&self) -> f64 {
        progress_percent(self.total_duration_seconds, self.remaining_seconds)
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted(&self) -> String {
        format_time(self.remaining_seconds)
    }

    /// Returns true if the timer is actively running.
    pub fn is_running(&self) -> bool {
        self.phase.is_active()
    }

    /// Returns true if the timer is paused.
    pub fn is_paused(&self) -> bool {
        self.phase == TimerPhase::Paused
    }
}

/// Read-only view of the timer delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub mode: TimerMode,
    #[serde(rename = "totalDurationSeconds")]
    pub total_duration_seconds: u32,
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u32,
    #[serde(rename = "startedAt", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub progress: f64,
    pub display: String,
}

impl From<&TimerState> for TimerSnapshot {
    fn from(state: &TimerState) -> Self {
        Self {
            phase: state.phase,
            mode: state.mode,
            total_duration_seconds: state.total_duration_seconds,
            remaining_seconds: state.remaining_seconds,
            started_at: state.started_at,
            progress: state.progress(),
            display: state.formatted(),
        }
    }
}

// ============================================================================
// Focus sessions
// ============================================================================

/// A terminated run, before persistence assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSessionInput {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "duration")]
    pub planned_minutes: u32,
    #[serde(rename = "actualTime")]
    pub actual_minutes: u32,
    #[serde(rename = "type")]
    pub mode: TimerMode,
    #[serde(rename = "startTime")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
}

/// A persisted focus session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "duration")]
    pub planned_minutes: u32,
    #[serde(rename = "actualTime", default)]
    pub actual_minutes: u32,
    #[serde(rename = "type", default)]
    pub mode: TimerMode,
    #[serde(rename = "startTime")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub ended_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FocusSession {
    /// Builds the stored form of a session.
    pub fn from_input(id: impl Into<String>, input: FocusSessionInput, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: input.user_id,
            planned_minutes: input.planned_minutes,
            actual_minutes: input.actual_minutes,
            mode: input.mode,
            started_at: input.started_at,
            ended_at: input.ended_at,
            completed: input.completed,
            created_at,
        }
    }

    /// UTC calendar day the session was recorded on.
    pub fn day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Identifier returned by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an id assigned by a store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthesizes a fallback id for a session that could not be stored.
    pub fn offline(at: DateTime<Utc>) -> Self {
        Self(format!("{}{}", OFFLINE_ID_PREFIX, at.timestamp_millis()))
    }

    /// Returns true for locally synthesized ids.
    pub fn is_offline(&self) -> bool {
        self.0.starts_with(OFFLINE_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// History projections
// ============================================================================

/// Aggregate statistics over a user's sessions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Completed sessions
    pub total_sessions: u32,
    /// Minutes across completed sessions
    pub total_focus_time: u32,
    pub average_session_length: f64,
    /// Completed over all sessions, in percent
    pub completion_rate: f64,
    pub streak_days: u32,
    pub longest_streak: u32,
}

/// One day of chart data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub sessions: u32,
    pub focus_time: u32,
}

// ============================================================================
// Tests
// ============================================================================
