//! Session recording.
//!
//! Turns a terminated run into exactly one stored `FocusSession`. Store
//! failures never propagate: the recorder logs them and hands back a
//! locally synthesized `offline-` id instead.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::identity::CurrentUser;
use crate::store::{SessionStore, StoreError};
use crate::timer::{Clock, SystemClock, TerminalRun};
use crate::types::SessionId;

/// Default upper bound on a single store write.
pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a run produced no session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nobody is signed in
    NoUser,
    /// Less than one whole minute elapsed
    TooShort,
}

/// Result of recording one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Stored under the returned id.
    Saved(SessionId),
    /// The store failed or timed out; carries the fallback id.
    Offline(SessionId),
    Skipped(SkipReason),
}

impl RecordOutcome {
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            RecordOutcome::Saved(id) | RecordOutcome::Offline(id) => Some(id),
            RecordOutcome::Skipped(_) => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, RecordOutcome::Saved(_))
    }
}

/// Hands terminated runs to a `SessionStore`.
pub struct SessionRecorder<S> {
    store: Arc<S>,
    user: Arc<dyn CurrentUser>,
    clock: Arc<dyn Clock>,
    save_timeout: Duration,
}

impl<S: SessionStore> SessionRecorder<S> {
    pub fn new(store: Arc<S>, user: Arc<dyn CurrentUser>) -> Self {
        Self {
            store,
            user,
            clock: Arc::new(SystemClock),
            save_timeout: DEFAULT_SAVE_TIMEOUT,
        }
    }

    /// Clock used to stamp fallback ids.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Records `run` for the current user.
    ///
    /// Always returns within the save timeout.
    pub async fn record(&self, run: &TerminalRun) -> RecordOutcome {
        let Some(user) = self.user.current_user() else {
            debug!("no signed-in user, session not recorded");
            return RecordOutcome::Skipped(SkipReason::NoUser);
        };

        let actual_minutes = run.actual_minutes();
        if actual_minutes == 0 {
            debug!("run shorter than a minute, session not recorded");
            return RecordOutcome::Skipped(SkipReason::TooShort);
        }

        let input = run.to_session(&user.id);
        let result = match tokio::time::timeout(self.save_timeout, self.store.save(input)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.save_timeout)),
        };

        match result {
            Ok(id) => {
                debug!(id = %id, actual_minutes, completed = run.completed, "session saved");
                RecordOutcome::Saved(SessionId::new(id))
            }
            Err(e) => {
                let fallback = SessionId::offline(self.clock.now());
                warn!("Failed to save session, continuing offline ({}): {}", fallback, e);
                RecordOutcome::Offline(fallback)
            }
        }
    }
}
