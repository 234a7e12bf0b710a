//! Session persistence.
//!
//! `SessionStore` is the document-store seam used by the recorder and the
//! history views. Stores assign the id and creation time on save and return
//! a user's sessions newest first.

mod file;
mod memory;
mod mock;

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{FocusSession, FocusSessionInput};

pub use file::JsonFileStore;
pub use memory::{demo_sessions, MemoryStore};
pub use mock::MockSessionStore;

/// Number of sessions returned when a query sets no explicit limit.
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// Errors reported by a session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing service could not be reached.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// The operation did not finish in time.
    #[error("session store timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if retrying later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_) | Self::Io(_))
    }
}

/// Filter for `SessionStore::query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuery {
    pub user_id: String,
    /// Maximum number of sessions; `None` returns all.
    pub limit: Option<usize>,
    /// Only sessions created at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

impl SessionQuery {
    /// Most recent sessions of `user_id`, up to `DEFAULT_QUERY_LIMIT`.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            limit: Some(DEFAULT_QUERY_LIMIT),
            since: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.limit = None;
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Filters `sessions`, orders them newest first and truncates.
    pub fn apply<'a>(&self, sessions: impl IntoIterator<Item = &'a FocusSession>) -> Vec<FocusSession> {
        let mut matched: Vec<FocusSession> = sessions
            .into_iter()
            .filter(|s| s.user_id == self.user_id)
            .filter(|s| self.since.is_none_or(|since| s.created_at >= since))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Durable storage for focus sessions.
pub trait SessionStore: Send + Sync + 'static {
    /// Persists a session and returns its id.
    fn save(
        &self,
        input: FocusSessionInput,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Returns the sessions matching `query`, newest first.
    fn query(
        &self,
        query: SessionQuery,
    ) -> impl Future<Output = Result<Vec<FocusSession>, StoreError>> + Send;
}
