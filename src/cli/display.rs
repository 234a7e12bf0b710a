//! Display utilities for the focusflow CLI.
//!
//! This module provides formatted output for:
//! - The live countdown line
//! - Record outcomes after a run
//! - History, stats and chart views
//! - Error and notice messages

use std::io::Write;

use crate::config::Settings;
use crate::i18n::{t, Language, MessageKey};
use crate::recorder::{RecordOutcome, SkipReason};
use crate::types::{ChartPoint, FocusSession, TimerMode, TimerPhase, TimerSnapshot, UserStats};

use super::commands::ChartMetric;

/// Width of the progress bar in the countdown line.
const PROGRESS_WIDTH: usize = 20;

/// Width of the longest bar in charts.
const CHART_WIDTH: u32 = 40;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Redraws the countdown line in place.
    pub fn show_tick(snapshot: &TimerSnapshot, lang: Language) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r{}", Self::tick_line(snapshot, lang));
        if snapshot.phase == TimerPhase::Completed {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }

    /// Countdown line: mode, status, `MM:SS`, progress bar and percentage.
    pub fn tick_line(snapshot: &TimerSnapshot, lang: Language) -> String {
        format!(
            "{} | {:<22} {} [{}] {:>3.0}%",
            Self::mode_label(snapshot.mode, lang),
            Self::phase_label(snapshot.phase, lang),
            snapshot.display,
            Self::progress_bar(snapshot.progress, PROGRESS_WIDTH),
            snapshot.progress
        )
    }

    pub fn mode_label(mode: TimerMode, lang: Language) -> &'static str {
        let key = match mode {
            TimerMode::Pomodoro => MessageKey::Pomodoro,
            TimerMode::DeepFocus => MessageKey::DeepFocus,
            TimerMode::Custom => MessageKey::Custom,
        };
        t(key, lang)
    }

    pub fn phase_label(phase: TimerPhase, lang: Language) -> &'static str {
        let key = match phase {
            TimerPhase::Idle => MessageKey::ReadyToFocus,
            TimerPhase::Running => MessageKey::Focusing,
            TimerPhase::Paused => MessageKey::Paused,
            TimerPhase::Completed => MessageKey::SessionCompleted,
        };
        t(key, lang)
    }

    /// Shows the keys accepted while a timer runs.
    pub fn show_controls() {
        println!("Enter p to pause or resume, s to stop. Ctrl-C stops the run.");
    }

    /// Shows the result of recording a run.
    pub fn show_record_outcome(outcome: &RecordOutcome, lang: Language) {
        match outcome {
            RecordOutcome::Saved(id) => {
                println!("✓ {} ({})", t(MessageKey::SessionSavedTitle, lang), id);
            }
            RecordOutcome::Offline(id) => {
                eprintln!("! Session could not be saved; kept as {}", id);
            }
            RecordOutcome::Skipped(SkipReason::NoUser) => {
                println!("Guest run: session not recorded");
            }
            RecordOutcome::Skipped(SkipReason::TooShort) => {
                println!("Run shorter than a minute: session not recorded");
            }
        }
    }

    /// Shows a session list, newest first.
    pub fn show_history(sessions: &[FocusSession], lang: Language) {
        if sessions.is_empty() {
            println!("{}", t(MessageKey::NoDataDesc, lang));
            return;
        }

        println!(
            "{:<17} {:<24} {:>8} {:>8}  {}",
            "Date", "Type", "Planned", "Actual", "Completed"
        );
        println!("{}", "─".repeat(70));
        for session in sessions {
            println!(
                "{:<17} {:<24} {:>8} {:>8}  {}",
                session.created_at.format("%Y-%m-%d %H:%M"),
                Self::mode_label(session.mode, lang),
                Self::format_minutes(session.planned_minutes),
                Self::format_minutes(session.actual_minutes),
                if session.completed { "Yes" } else { "No" }
            );
        }
    }

    /// Shows aggregate statistics.
    pub fn show_stats(stats: &UserStats, lang: Language) {
        println!("{}: {}", t(MessageKey::TotalSessions, lang), stats.total_sessions);
        println!("Focus time: {}", Self::format_minutes(stats.total_focus_time));
        println!(
            "Average session: {}",
            Self::format_minutes(stats.average_session_length.round() as u32)
        );
        println!(
            "{:.0}% {}",
            stats.completion_rate,
            t(MessageKey::CompletionRate, lang)
        );
        println!(
            "{}: {} (longest {})",
            t(MessageKey::Streak, lang),
            Self::format_days(stats.streak_days),
            Self::format_days(stats.longest_streak)
        );
    }

    /// Shows a horizontal bar chart, oldest day first.
    pub fn show_chart(points: &[ChartPoint], metric: ChartMetric) {
        for line in Self::chart_lines(points, metric) {
            println!("{}", line);
        }
    }

    pub fn chart_lines(points: &[ChartPoint], metric: ChartMetric) -> Vec<String> {
        let value = |p: &ChartPoint| match metric {
            ChartMetric::Sessions => p.sessions,
            ChartMetric::FocusTime => p.focus_time,
        };
        let max = points.iter().map(value).max().unwrap_or(0).max(1);

        points
            .iter()
            .map(|p| {
                let v = value(p);
                let len = (v * CHART_WIDTH).div_ceil(max) as usize;
                format!("{} {:<width$} {}", p.date.format("%m-%d"), "█".repeat(len), v, width = CHART_WIDTH as usize)
            })
            .collect()
    }

    /// Shows the current settings.
    pub fn show_settings(settings: &Settings) {
        let on_off = |b: bool| if b { "on" } else { "off" };
        println!("sound:           {}", on_off(settings.sound_enabled));
        println!("notifications:   {}", on_off(settings.notifications_enabled));
        println!("language:        {}", settings.language);
        println!("default mode:    {}", settings.default_mode);
        println!("custom minutes:  {}", settings.custom_minutes);
        println!(
            "user:            {}",
            settings.user_id.as_deref().unwrap_or("(guest)")
        );
    }

    /// Shows a successful export.
    pub fn show_export_success(path: &std::path::Path, count: usize, lang: Language) {
        println!(
            "{}: {} ({} sessions)",
            t(MessageKey::ExportSuccessful, lang),
            path.display(),
            count
        );
        println!("{}", t(MessageKey::ExportSuccessfulDesc, lang));
    }

    /// Shows the localized "nothing to export" notice.
    pub fn show_no_data(lang: Language) {
        eprintln!(
            "{}: {}",
            t(MessageKey::NoData, lang),
            t(MessageKey::NoDataDesc, lang)
        );
    }

    /// Shows an informational notice on stderr.
    pub fn show_notice(message: &str) {
        eprintln!("note: {}", message);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    /// `1h 05m` above an hour, `25m` otherwise.
    pub fn format_minutes(minutes: u32) -> String {
        let hours = minutes / 60;
        let mins = minutes % 60;
        if hours > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}m", mins)
        }
    }

    fn format_days(days: u32) -> String {
        if days == 1 {
            "1 day".to_string()
        } else {
            format!("{} days", days)
        }
    }

    fn progress_bar(progress: f64, width: usize) -> String {
        let filled = ((progress / 100.0) * width as f64).round() as usize;
        let filled = filled.min(width);
        format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
    }
}

// ============================================================================
// Tests
// ============================================================================
