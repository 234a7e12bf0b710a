//! Persisted user preferences.
//!
//! Settings live in a JSON file; missing fields take their defaults and a
//! missing file yields `Settings::default()`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::i18n::Language;
use crate::types::{clamp_minutes, TimerMode};

/// Directory name under the platform config and data dirs.
pub const APP_DIR: &str = "focusflow";

/// Settings file name.
pub const SETTINGS_FILE: &str = "settings.json";

/// Session store file name.
pub const SESSIONS_FILE: &str = "sessions.json";

fn default_true() -> bool {
    true
}

fn default_language() -> Language {
    Language::from_env()
}

fn default_custom_minutes() -> u32 {
    TimerMode::Custom.default_minutes()
}

/// Accepted range for `save_timeout_secs`.
pub const SAVE_TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=300;

fn default_save_timeout_secs() -> u64 {
    10
}

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The platform reports no config or data directory.
    #[error("could not determine the {0} directory for this platform")]
    NoPlatformDir(&'static str),
}

/// User preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Play a sound when a run completes.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    /// Show a notification when a run completes.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    #[serde(default = "default_language")]
    pub language: Language,

    /// Mode selected when `start` is given none.
    #[serde(default)]
    pub default_mode: TimerMode,

    /// Duration of the custom mode, in minutes.
    #[serde(default = "default_custom_minutes")]
    pub custom_minutes: u32,

    /// Signed-in profile; sessions are recorded only when set.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Upper bound on a single session save.
    #[serde(default = "default_save_timeout_secs")]
    pub save_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            notifications_enabled: true,
            language: default_language(),
            default_mode: TimerMode::default(),
            custom_minutes: default_custom_minutes(),
            user_id: None,
            save_timeout_secs: default_save_timeout_secs(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults if it is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut settings: Settings =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.custom_minutes = clamp_minutes(i64::from(settings.custom_minutes));
        settings.save_timeout_secs = clamp_save_timeout_secs(settings.save_timeout_secs);
        Ok(settings)
    }

    /// Writes settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)?;
        debug!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// Sets the custom duration, clamped to the valid range.
    pub fn set_custom_minutes(&mut self, minutes: i64) {
        self.custom_minutes = clamp_minutes(minutes);
    }

    /// Duration to use for `mode`.
    pub fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Custom => self.custom_minutes,
            other => other.default_minutes(),
        }
    }

    /// Save timeout, clamped even if the field was set directly.
    pub fn save_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(clamp_save_timeout_secs(self.save_timeout_secs))
    }
}

/// Clamps a save timeout into `SAVE_TIMEOUT_RANGE_SECS`.
pub fn clamp_save_timeout_secs(secs: u64) -> u64 {
    secs.clamp(*SAVE_TIMEOUT_RANGE_SECS.start(), *SAVE_TIMEOUT_RANGE_SECS.end())
}

/// `<config_dir>/focusflow/settings.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
        .ok_or(ConfigError::NoPlatformDir("config"))
}

/// `<data_dir>/focusflow`
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(ConfigError::NoPlatformDir("data"))
}

/// Session file inside `data_dir`.
pub fn sessions_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSIONS_FILE)
}
