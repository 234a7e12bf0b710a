//! Sound system error types.
//!
//! Sound is best-effort: every error here is logged and swallowed by the
//! notification dispatcher, never propagated to the timer.

use thiserror::Error;

/// Errors that can occur in the sound playback system.
#[derive(Debug, Error)]
pub enum SoundError {
    /// No output device is available.
    #[error("audio output is not available: {0}")]
    DeviceNotAvailable(String),

    /// Opening an audio stream or sink failed.
    #[error("audio stream error: {0}")]
    StreamError(String),

    /// Writing to the output failed.
    #[error("sound playback failed: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "check that an audio output device is connected",
            Self::StreamError(_) => "check the system audio configuration",
            Self::PlaybackError(_) => "disable sound with `focusflow settings --sound off`",
        }
    }
}

impl From<std::io::Error> for SoundError {
    fn from(err: std::io::Error) -> Self {
        Self::PlaybackError(err.to_string())
    }
}
