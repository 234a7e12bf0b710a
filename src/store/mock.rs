//! Session store with failure and latency injection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::types::{FocusSession, FocusSessionInput};

use super::{MemoryStore, SessionQuery, SessionStore, StoreError};

/// Mock session store for testing.
///
/// Delegates to a `MemoryStore` unless told to fail or hang.
#[derive(Default)]
pub struct MockSessionStore {
    inner: MemoryStore,
    save_calls: AtomicUsize,
    should_fail: AtomicBool,
    should_hang: AtomicBool,
}

impl MockSessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call return `StoreError::Unavailable`.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Makes `save` never resolve.
    pub fn set_should_hang(&self, should_hang: bool) {
        self.should_hang.store(should_hang, Ordering::SeqCst);
    }

    /// Number of `save` calls, including failed ones.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Inserts a stored session directly, bypassing `save`.
    pub fn insert(&self, session: FocusSession) {
        self.inner.insert(session);
    }

    /// Sessions saved successfully.
    #[must_use]
    pub fn saved(&self) -> Vec<FocusSession> {
        self.inner.all()
    }
}

impl SessionStore for MockSessionStore {
    async fn save(&self, input: FocusSessionInput) -> Result<String, StoreError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Mock failure".to_string()));
        }
        self.inner.save(input).await
    }

    async fn query(&self, query: SessionQuery) -> Result<Vec<FocusSession>, StoreError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Mock failure".to_string()));
        }
        self.inner.query(query).await
    }
}
