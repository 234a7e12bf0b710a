//! Notification error types.

use thiserror::Error;

/// Errors that can occur when delivering a system notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// The user has not granted notification permission.
    #[error("notification permission has not been granted")]
    PermissionDenied,

    /// Failed to deliver a notification.
    #[error("failed to send notification: {0}")]
    SendFailed(String),

    /// No notification backend is available.
    #[error("notification backend is not available")]
    NotAvailable,
}

impl NotificationError {
    /// Returns true if this error is related to permissions.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Enable notifications with `focusflow settings --notifications on`",
            Self::SendFailed(_) => "Check that the terminal is still attached and retry",
            Self::NotAvailable => "Notifications are unavailable here; the timer keeps working without them",
        }
    }
}

impl From<std::io::Error> for NotificationError {
    fn from(err: std::io::Error) -> Self {
        Self::SendFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NotificationError::PermissionDenied;
        assert_eq!(err.to_string(), "notification permission has not been granted");

        let err = NotificationError::SendFailed("broken pipe".to_string());
        assert!(err.to_string().contains("broken pipe"));
    }

    #[test]
    fn test_is_permission_error() {
        assert!(NotificationError::PermissionDenied.is_permission_error());
        assert!(!NotificationError::NotAvailable.is_permission_error());
    }

    #[test]
    fn test_suggestion() {
        assert!(NotificationError::PermissionDenied
            .suggestion()
            .contains("--notifications on"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: NotificationError = io.into();
        assert!(matches!(err, NotificationError::SendFailed(_)));
    }
}
