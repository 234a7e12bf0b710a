//! focusflow library
//!
//! Core of a focus/Pomodoro timer. It includes:
//! - Countdown state machine with an async tick driver
//! - Exactly-once session recording with offline fallback ids
//! - Completion feedback through notification and sound backends
//! - Session stores (in-memory, JSON file, mock)
//! - History analytics: stats, streaks and chart data
//! - CSV export, localized messages and persisted settings
//! - CLI command parsing, execution and display

pub mod analytics;
pub mod cli;
pub mod config;
pub mod export;
pub mod i18n;
pub mod identity;
pub mod notification;
pub mod observer;
pub mod recorder;
pub mod sound;
pub mod store;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    ChartPoint, FocusSession, FocusSessionInput, SessionId, TimerMode, TimerPhase, TimerSnapshot,
    TimerState, UserStats,
};

pub use observer::{Subscribers, Subscription};

pub use timer::{
    Clock, MockClock, SessionPipeline, SystemClock, TerminalRun, TimerController, TimerEngine,
    TimerEvent,
};

pub use recorder::{RecordOutcome, SessionRecorder, SkipReason};

pub use store::{
    JsonFileStore, MemoryStore, MockSessionStore, SessionQuery, SessionStore, StoreError,
};

pub use identity::{AuthError, CurrentUser, LocalIdentity, User};

pub use notification::{
    ConsoleNotifier, MockNotifier, NotificationDispatcher, NotificationError, Notifier,
    PermissionState,
};

pub use sound::{
    create_player, MockSoundPlayer, RodioSoundPlayer, SilentPlayer, SoundError, SoundKind,
    SoundPlayer, TerminalBellPlayer, Tone,
};

pub use analytics::{chart_data, compute_user_stats, current_streak, longest_streak, HistoryService};

pub use export::{export_filename, sessions_to_csv, write_csv, ExportError};

pub use i18n::{t, t_with, Language, MessageKey};

pub use config::{ConfigError, Settings};
