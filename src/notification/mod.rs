//! Completion feedback: system notifications and sounds.
//!
//! The timer core depends only on the `Notifier` and `SoundPlayer` traits.
//! `NotificationDispatcher` applies the user's toggles and the one-time
//! permission request on top of them.

mod dispatcher;
pub mod error;

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub use self::dispatcher::NotificationDispatcher;
pub use self::error::NotificationError;

/// Notification permission as last reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Never requested
    #[default]
    Default,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

/// Backend that can display a system notification.
pub trait Notifier: Send + Sync {
    /// Asks the user for permission. Returns true if granted.
    fn request_permission(&self) -> bool;

    /// Shows a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered.
    fn notify(&self, title: &str, body: &str) -> Result<(), NotificationError>;
}

// ============================================================================
// ConsoleNotifier
// ============================================================================

/// Notifier that prints notifications to stderr.
///
/// A terminal needs no permission, so requests are always granted.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn request_permission(&self) -> bool {
        true
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "\n{}\n{}", title, body)?;
        Ok(())
    }
}

// ============================================================================
// MockNotifier
// ============================================================================

/// Mock notifier for testing.
#[derive(Debug)]
pub struct MockNotifier {
    grant: AtomicBool,
    should_fail: AtomicBool,
    permission_requests: AtomicUsize,
    sent: Mutex<Vec<(String, String)>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MockNotifier {
    /// Creates a mock that answers permission requests with `grant`.
    #[must_use]
    pub fn new(grant: bool) -> Self {
        Self {
            grant: AtomicBool::new(grant),
            should_fail: AtomicBool::new(false),
            permission_requests: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    /// Title/body pairs delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Notifier for MockNotifier {
    fn request_permission(&self) -> bool {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        self.grant.load(Ordering::SeqCst)
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}
