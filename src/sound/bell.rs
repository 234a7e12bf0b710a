//! Terminal bell fallback.
//!
//! Used when no audio output device is available: each tone of a cue
//! becomes one BEL character on stderr.

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::error::SoundError;
use super::SoundKind;

const BEL: &[u8] = b"\x07";

/// A sound player that rings the terminal bell.
#[derive(Debug)]
pub struct TerminalBellPlayer {
    disabled: AtomicBool,
}

impl TerminalBellPlayer {
    /// Creates a new player.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if stderr is not a terminal.
    pub fn new(disabled: bool) -> Result<Self, SoundError> {
        if !std::io::stderr().is_terminal() {
            return Err(SoundError::DeviceNotAvailable(
                "stderr is not a terminal".to_string(),
            ));
        }
        Ok(Self::unchecked(disabled))
    }

    /// Creates a player without probing the terminal.
    #[must_use]
    pub fn unchecked(disabled: bool) -> Self {
        Self {
            disabled: AtomicBool::new(disabled),
        }
    }

    /// Rings the bell once per tone of `kind`.
    pub fn play(&self, kind: SoundKind) -> Result<(), SoundError> {
        if self.disabled.load(Ordering::Relaxed) {
            debug!("Sound playback disabled, skipping");
            return Ok(());
        }

        debug!(kind = kind.as_str(), "Ringing terminal bell");
        let mut stderr = std::io::stderr().lock();
        for _ in kind.tones() {
            stderr.write_all(BEL)?;
        }
        stderr.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_player_skips_playback() {
        let player = TerminalBellPlayer::unchecked(true);
        assert!(player.is_disabled());
        assert!(player.play(SoundKind::Completion).is_ok());
    }

    #[test]
    fn test_enable_disable() {
        let player = TerminalBellPlayer::unchecked(true);

        player.enable();
        assert!(!player.is_disabled());

        player.disable();
        assert!(player.is_disabled());
    }
}
