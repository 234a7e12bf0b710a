//! Completion feedback dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::i18n::{t, t_with, Language, MessageKey};
use crate::sound::{SoundKind, SoundPlayer};
use crate::timer::TerminalRun;

use super::{Notifier, PermissionState};

/// Applies the user's sound and notification toggles to completion events.
///
/// Every operation is best-effort: backend failures are logged and never
/// reach the caller.
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    sound: Arc<dyn SoundPlayer>,
    sound_enabled: AtomicBool,
    notifications_enabled: AtomicBool,
    permission: Mutex<PermissionState>,
    language: Language,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, sound: Arc<dyn SoundPlayer>, language: Language) -> Self {
        Self {
            notifier,
            sound,
            sound_enabled: AtomicBool::new(true),
            notifications_enabled: AtomicBool::new(true),
            permission: Mutex::new(PermissionState::Default),
            language,
        }
    }

    /// Sets both toggles at construction.
    pub fn with_toggles(self, sound_enabled: bool, notifications_enabled: bool) -> Self {
        self.sound_enabled.store(sound_enabled, Ordering::Relaxed);
        self.notifications_enabled
            .store(notifications_enabled, Ordering::Relaxed);
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn permission(&self) -> PermissionState {
        *self.lock_permission()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled.load(Ordering::Relaxed)
    }

    /// Toggles notifications. Enabling asks for permission if it was never
    /// requested; returns whether notifications can now be shown.
    pub fn set_notifications_enabled(&self, enabled: bool) -> bool {
        self.notifications_enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            return false;
        }
        self.ensure_permission()
    }

    /// Requests notification permission once.
    ///
    /// Later calls return the cached answer without asking again. Does
    /// nothing while notifications are disabled.
    pub fn ensure_permission(&self) -> bool {
        if !self.notifications_enabled() {
            return false;
        }

        let mut permission = self.lock_permission();
        if *permission == PermissionState::Default {
            *permission = if self.notifier.request_permission() {
                debug!("notification permission granted");
                PermissionState::Granted
            } else {
                info!(
                    "{}",
                    t(MessageKey::NotificationPermissionDenied, self.language)
                );
                PermissionState::Denied
            };
        }
        permission.is_granted()
    }

    /// Localized notice for a denied permission while notifications are on.
    ///
    /// Callers show it once, after the first permission request.
    pub fn denial_notice(&self) -> Option<&'static str> {
        (self.notifications_enabled() && self.permission() == PermissionState::Denied)
            .then(|| t(MessageKey::NotificationPermissionDenied, self.language))
    }

    /// Plays the completion sound and shows the completion notification,
    /// each gated by its toggle.
    pub fn on_completion(&self, run: &TerminalRun) {
        if self.sound_enabled() {
            if let Err(e) = self.sound.play(SoundKind::Completion) {
                warn!("Failed to play completion sound: {}", e);
            }
        }

        if !self.notifications_enabled() {
            return;
        }
        if !self.permission().is_granted() {
            debug!("notification skipped: permission not granted");
            return;
        }

        let (title, body) = self.completion_message(run.planned_minutes);
        if let Err(e) = self.notifier.notify(&title, &body) {
            warn!("Failed to send completion notification: {}", e);
        }
    }

    /// Localized completion title and body.
    pub fn completion_message(&self, planned_minutes: u32) -> (String, String) {
        let title = format!("🎉 {}", t(MessageKey::SessionCompleted, self.language));
        let body = t_with(
            MessageKey::SessionCompletedDesc,
            self.language,
            &[("duration", &planned_minutes.to_string())],
        );
        (title, body)
    }

    fn lock_permission(&self) -> std::sync::MutexGuard<'_, PermissionState> {
        self.permission.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("sound_enabled", &self.sound_enabled())
            .field("notifications_enabled", &self.notifications_enabled())
            .field("permission", &self.permission())
            .field("language", &self.language)
            .finish()
    }
}
