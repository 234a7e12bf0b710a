//! In-memory session store.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::timer::{Clock, SystemClock};
use crate::types::{FocusSession, FocusSessionInput, TimerMode};

use super::{SessionQuery, SessionStore, StoreError};

/// Days of history produced by `MemoryStore::seed_demo`.
const DEMO_DAYS: i64 = 14;

/// Owned, process-local session store.
///
/// Holds sessions for the lifetime of the value; used for guest runs,
/// demos and tests.
pub struct MemoryStore {
    sessions: Mutex<Vec<FocusSession>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Stamps `created_at` from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// Inserts a stored session as-is.
    pub fn insert(&self, session: FocusSession) {
        self.lock().push(session);
    }

    /// Every stored session, in insertion order.
    pub fn all(&self) -> Vec<FocusSession> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills the store with two weeks of demo history for `user_id`, ending
    /// on the day of `now`. Output depends only on the arguments.
    ///
    /// Returns the number of sessions added.
    pub fn seed_demo(&self, user_id: &str, now: DateTime<Utc>) -> usize {
        let demo = demo_sessions(user_id, now);
        let count = demo.len();
        self.lock().extend(demo);
        debug!(count, user_id, "seeded demo sessions");
        count
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FocusSession>> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    async fn save(&self, input: FocusSessionInput) -> Result<String, StoreError> {
        let id = format!("session-{}", Uuid::new_v4());
        let session = FocusSession::from_input(id.clone(), input, self.clock.now());
        self.lock().push(session);
        Ok(id)
    }

    async fn query(&self, query: SessionQuery) -> Result<Vec<FocusSession>, StoreError> {
        Ok(query.apply(self.lock().iter()))
    }
}

/// Deterministic demo history. Every fifth day is left empty so streaks
/// have visible gaps.
pub fn demo_sessions(user_id: &str, now: DateTime<Utc>) -> Vec<FocusSession> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let mut sessions = Vec::new();

    for days_ago in 0..DEMO_DAYS {
        if days_ago % 5 == 4 {
            continue;
        }
        let day = midnight - Duration::days(days_ago);
        let per_day = 1 + (days_ago % 3);

        for i in 0..per_day {
            let mode = TimerMode::ALL[((days_ago + i) % 3) as usize];
            let planned = mode.default_minutes();
            let completed = (days_ago + i) % 4 != 3;
            let actual = if completed { planned } else { planned / 2 };
            let started_at = day + Duration::hours(9 + 2 * i);
            let ended_at = started_at + Duration::minutes(i64::from(actual));

            sessions.push(FocusSession {
                id: format!("demo-{}-{}", days_ago, i),
                user_id: user_id.to_string(),
                planned_minutes: planned,
                actual_minutes: actual,
                mode,
                started_at,
                ended_at,
                completed,
                created_at: ended_at,
            });
        }
    }
    sessions
}
