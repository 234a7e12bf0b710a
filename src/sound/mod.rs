//! Sound playback for the focus timer.
//!
//! Completion feedback is routed through the `SoundPlayer` trait so the
//! notification dispatcher never depends on a concrete audio backend.
//! Playback is best-effort and must never affect timer correctness.
//!
//! Backends, in order of preference:
//! - `RodioSoundPlayer`: synthesized tones on the default output device
//! - `TerminalBellPlayer`: BEL characters when no device is available
//! - `SilentPlayer`: when neither works

mod bell;
mod error;
mod player;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

pub use bell::TerminalBellPlayer;
pub use error::SoundError;
pub use player::{try_create_player, RodioSoundPlayer};

/// One sine tone of a cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
    /// Linear amplitude, 0.0 to 1.0
    pub gain: f32,
}

impl Tone {
    const fn new(frequency_hz: f32, millis: u64, gain: f32) -> Self {
        Self {
            frequency_hz,
            duration: Duration::from_millis(millis),
            gain,
        }
    }
}

/// C5-E5-G5-C6 arpeggio.
const COMPLETION_TONES: [Tone; 4] = [
    Tone::new(523.25, 200, 0.3),
    Tone::new(659.25, 200, 0.3),
    Tone::new(783.99, 200, 0.3),
    Tone::new(1046.50, 300, 0.3),
];

const TICK_TONES: [Tone; 1] = [Tone::new(800.0, 100, 0.1)];

const WARNING_TONES: [Tone; 1] = [Tone::new(440.0, 500, 0.2)];

/// Kinds of feedback sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// Run completed
    Completion,
    /// Per-second tick
    Tick,
    /// Attention cue
    Warning,
}

impl SoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundKind::Completion => "completion",
            SoundKind::Tick => "tick",
            SoundKind::Warning => "warning",
        }
    }

    /// Tones of the cue, played in order.
    pub fn tones(&self) -> &'static [Tone] {
        match self {
            SoundKind::Completion => &COMPLETION_TONES,
            SoundKind::Tick => &TICK_TONES,
            SoundKind::Warning => &WARNING_TONES,
        }
    }
}

/// Trait for sound playback implementations.
pub trait SoundPlayer: Send + Sync {
    /// Plays a sound without blocking the caller for its duration.
    ///
    /// # Errors
    ///
    /// Returns an error if playback fails.
    fn play(&self, kind: SoundKind) -> Result<(), SoundError>;

    /// Returns true if sound playback is disabled.
    fn is_disabled(&self) -> bool;

    /// Enables sound playback.
    fn enable(&self);

    /// Disables sound playback.
    fn disable(&self);
}

impl SoundPlayer for RodioSoundPlayer {
    fn play(&self, kind: SoundKind) -> Result<(), SoundError> {
        RodioSoundPlayer::play(self, kind)
    }

    fn is_disabled(&self) -> bool {
        RodioSoundPlayer::is_disabled(self)
    }

    fn enable(&self) {
        RodioSoundPlayer::enable(self)
    }

    fn disable(&self) {
        RodioSoundPlayer::disable(self)
    }
}

impl SoundPlayer for TerminalBellPlayer {
    fn play(&self, kind: SoundKind) -> Result<(), SoundError> {
        TerminalBellPlayer::play(self, kind)
    }

    fn is_disabled(&self) -> bool {
        TerminalBellPlayer::is_disabled(self)
    }

    fn enable(&self) {
        TerminalBellPlayer::enable(self)
    }

    fn disable(&self) {
        TerminalBellPlayer::disable(self)
    }
}

/// Creates the best available player.
///
/// Falls back from rodio to the terminal bell, then to `SilentPlayer`.
#[must_use]
pub fn create_player(disabled: bool) -> Arc<dyn SoundPlayer> {
    if let Some(player) = try_create_player(disabled) {
        return player;
    }
    match TerminalBellPlayer::new(disabled) {
        Ok(bell) => {
            debug!("Using terminal bell for sound");
            Arc::new(bell)
        }
        Err(e) => {
            debug!("Terminal bell not available, sound disabled: {}", e);
            Arc::new(SilentPlayer)
        }
    }
}

/// Player that discards every sound; used when no output is available.
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&self, _kind: SoundKind) -> Result<(), SoundError> {
        Ok(())
    }

    fn is_disabled(&self) -> bool {
        true
    }

    fn enable(&self) {}

    fn disable(&self) {}
}

/// Mock sound player for testing.
#[derive(Debug, Default)]
pub struct MockSoundPlayer {
    play_calls: Mutex<Vec<SoundKind>>,
    disabled: AtomicBool,
    should_fail: AtomicBool,
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.lock_calls().len()
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<SoundKind> {
        self.lock_calls().clone()
    }

    pub fn clear_calls(&self) {
        self.lock_calls().clear();
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<SoundKind>> {
        self.play_calls.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self, kind: SoundKind) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        if self.disabled.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.lock_calls().push(kind);
        Ok(())
    }

    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    fn enable(&self) {
        self.disabled.store(false, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.disabled.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_kind() {
        assert_eq!(SoundKind::Completion.as_str(), "completion");
        assert_eq!(SoundKind::Tick.tones().len(), 1);
        assert_eq!(SoundKind::Warning.tones()[0].frequency_hz, 440.0);
    }

    #[test]
    fn test_completion_cue_is_rising_arpeggio() {
        let tones = SoundKind::Completion.tones();
        let frequencies: Vec<f32> = tones.iter().map(|t| t.frequency_hz).collect();

        assert_eq!(frequencies, vec![523.25, 659.25, 783.99, 1046.50]);
        assert!(tones.iter().all(|t| t.gain == 0.3));
        assert_eq!(tones[3].duration, Duration::from_millis(300));
    }

    #[test]
    fn test_create_player_never_fails() {
        let player = create_player(true);
        assert!(player.play(SoundKind::Completion).is_ok());
    }

    #[test]
    fn test_mock_records_calls() {
        let mock = MockSoundPlayer::new();
        mock.play(SoundKind::Completion).unwrap();
        mock.play(SoundKind::Warning).unwrap();

        assert_eq!(mock.play_count(), 2);
        assert_eq!(
            mock.get_play_calls(),
            vec![SoundKind::Completion, SoundKind::Warning]
        );

        mock.clear_calls();
        assert_eq!(mock.play_count(), 0);
    }

    #[test]
    fn test_mock_disabled_skips() {
        let mock = MockSoundPlayer::new();
        mock.disable();
        assert!(mock.is_disabled());
        mock.play(SoundKind::Completion).unwrap();
        assert_eq!(mock.play_count(), 0);
    }

    #[test]
    fn test_mock_failure() {
        let mock = MockSoundPlayer::new();
        mock.set_should_fail(true);
        assert!(mock.play(SoundKind::Completion).is_err());
    }

    #[test]
    fn test_silent_player() {
        let player = SilentPlayer;
        assert!(player.play(SoundKind::Completion).is_ok());
        assert!(player.is_disabled());
    }
}
