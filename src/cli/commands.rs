//! Command definitions for the focusflow CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::i18n::Language;
use crate::types::{parse_minutes, TimerMode};

// ============================================================================
// CLI Structure
// ============================================================================

/// focusflow - focus timer with session history, streaks and CSV export
#[derive(Parser, Debug)]
#[command(
    name = "focusflow",
    version,
    about = "Focus timer with session history, streaks and CSV export",
    long_about = "A terminal focus timer with Pomodoro, Deep Focus and custom modes.\n\
                  Completed and stopped runs are saved to a local history that powers\n\
                  stats, streaks, charts and CSV export.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the session history
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a focus timer in the foreground
    Start(StartArgs),

    /// List recent sessions
    History {
        /// Maximum number of sessions to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Show totals, completion rate and streaks
    Stats,

    /// Show daily sessions or focus time as a bar chart
    Chart(ChartArgs),

    /// Export session history as CSV
    Export {
        /// Output file (defaults to focus-sessions-<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or change settings
    Settings(SettingsArgs),

    /// Fill the history with two weeks of demo sessions
    #[command(hide = true)]
    SeedDemo,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Command Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone)]
pub struct StartArgs {
    /// Timer mode: pomodoro, deep-focus or custom
    #[arg(short, long)]
    pub mode: Option<TimerMode>,

    /// Duration in minutes, clamped to 1-180 (implies custom mode)
    #[arg(short = 'n', long, value_parser = parse_minutes_arg)]
    pub minutes: Option<u32>,

    /// Run without recording the session
    #[arg(long)]
    pub guest: bool,

    /// Tick period in milliseconds
    #[arg(
        long,
        hide = true,
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub tick_millis: u64,
}

impl StartArgs {
    /// Mode to run: explicit, else custom when minutes are given, else `fallback`.
    pub fn resolve_mode(&self, fallback: TimerMode) -> TimerMode {
        match (self.mode, self.minutes) {
            (Some(mode), _) => mode,
            (None, Some(_)) => TimerMode::Custom,
            (None, None) => fallback,
        }
    }
}

/// Chart series
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartMetric {
    /// Completed sessions per day
    #[default]
    Sessions,
    /// Focus minutes per day
    FocusTime,
}

/// Arguments for the chart command
#[derive(Args, Debug, Clone)]
pub struct ChartArgs {
    /// Number of days ending today
    #[arg(
        short,
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..=365)
    )]
    pub days: u32,

    /// Series to plot
    #[arg(short, long, value_enum, default_value_t = ChartMetric::Sessions)]
    pub metric: ChartMetric,
}

/// On/off switch
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

/// Arguments for the settings command
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Completion sound
    #[arg(long, value_enum)]
    pub sound: Option<Toggle>,

    /// Completion notification
    #[arg(long, value_enum)]
    pub notifications: Option<Toggle>,

    /// Display language: en, es, fr, de or hi
    #[arg(long)]
    pub language: Option<Language>,

    /// Profile id sessions are recorded under
    #[arg(long, conflicts_with = "sign_out")]
    pub user: Option<String>,

    /// Clear the profile; runs are no longer recorded
    #[arg(long)]
    pub sign_out: bool,

    /// Custom mode duration in minutes, clamped to 1-180
    #[arg(long, value_parser = parse_minutes_arg)]
    pub custom_minutes: Option<u32>,

    /// Mode used when start is given none
    #[arg(long)]
    pub default_mode: Option<TimerMode>,
}

impl SettingsArgs {
    /// Returns true if any setting is being changed.
    pub fn has_changes(&self) -> bool {
        self.sound.is_some()
            || self.notifications.is_some()
            || self.language.is_some()
            || self.user.is_some()
            || self.sign_out
            || self.custom_minutes.is_some()
            || self.default_mode.is_some()
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a duration, clamping out-of-range or non-numeric input.
fn parse_minutes_arg(s: &str) -> Result<u32, String> {
    Ok(parse_minutes(s))
}

// ============================================================================
// Tests
// ============================================================================
