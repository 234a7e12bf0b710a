//! Sound player implementation using rodio.
//!
//! `RodioSoundPlayer` synthesizes each cue from sine tones. The rodio
//! output stream is not `Send`, so it is opened and owned by a dedicated
//! output thread; the player itself only holds the command channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::source::SineWave;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use super::error::SoundError;
use super::SoundKind;

/// Attack ramp applied to every tone.
const FADE_IN: Duration = Duration::from_millis(50);

/// A sound player that uses rodio for audio playback.
///
/// Playback is non-blocking: cues are queued to the output thread and play
/// one after another. Dropping the player lets a queued cue finish before
/// the output stream closes.
pub struct RodioSoundPlayer {
    commands: Mutex<Option<Sender<SoundKind>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    disabled: AtomicBool,
}

impl RodioSoundPlayer {
    /// Opens the default output device and starts the output thread.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(disabled: bool) -> Result<Self, SoundError> {
        let (tx, rx) = mpsc::channel::<SoundKind>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), SoundError>>(1);

        let worker = thread::Builder::new()
            .name("sound-output".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = ready_tx.send(Ok(()));
                        pair
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
                        return;
                    }
                };

                while let Ok(kind) = rx.recv() {
                    if let Err(e) = play_tones(&handle, kind) {
                        warn!("Failed to play {} sound: {}", kind.as_str(), e);
                    }
                }
                debug!("sound output thread finished");
            })
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        let ready = ready_rx.recv().unwrap_or_else(|_| {
            Err(SoundError::DeviceNotAvailable(
                "sound output thread exited during startup".to_string(),
            ))
        });
        if let Err(e) = ready {
            let _ = worker.join();
            return Err(e);
        }

        debug!("Audio output stream initialized");
        Ok(Self {
            commands: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            disabled: AtomicBool::new(disabled),
        })
    }

    /// Queues the cue for `kind`.
    pub fn play(&self, kind: SoundKind) -> Result<(), SoundError> {
        if self.disabled.load(Ordering::Relaxed) {
            debug!("Sound playback disabled, skipping");
            return Ok(());
        }

        let commands = self.commands.lock().unwrap_or_else(|p| p.into_inner());
        let sent = commands.as_ref().is_some_and(|tx| tx.send(kind).is_ok());
        if !sent {
            return Err(SoundError::PlaybackError(
                "sound output thread is not running".to_string(),
            ));
        }
        debug!(kind = kind.as_str(), "Sound queued");
        Ok(())
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Relaxed);
        debug!("Sound playback enabled");
    }

    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
        debug!("Sound playback disabled");
    }
}

impl Drop for RodioSoundPlayer {
    fn drop(&mut self) {
        // closing the channel ends the output loop once the queue drains
        drop(self.commands.lock().unwrap_or_else(|p| p.into_inner()).take());
        let worker = self.worker.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                warn!("sound output thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer")
            .field("disabled", &self.disabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Plays every tone of `kind` in sequence and waits for the last one.
fn play_tones(handle: &OutputStreamHandle, kind: SoundKind) -> Result<(), SoundError> {
    let sink = Sink::try_new(handle).map_err(|e| SoundError::StreamError(e.to_string()))?;

    for tone in kind.tones() {
        sink.append(
            SineWave::new(tone.frequency_hz)
                .take_duration(tone.duration)
                .fade_in(FADE_IN)
                .amplify(tone.gain),
        );
    }
    sink.sleep_until_end();
    Ok(())
}

/// Creates a rodio player, returning None if audio is unavailable.
#[must_use]
pub fn try_create_player(disabled: bool) -> Option<Arc<RodioSoundPlayer>> {
    match RodioSoundPlayer::new(disabled) {
        Ok(player) => Some(Arc::new(player)),
        Err(e) => {
            debug!("Audio not available: {}", e);
            None
        }
    }
}
