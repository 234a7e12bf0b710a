//! JSON file session store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::timer::{Clock, SystemClock};
use crate::types::{FocusSession, FocusSessionInput};

use super::{SessionQuery, SessionStore, StoreError};

/// Session store backed by a single JSON document on disk.
///
/// Writes replace the whole file through a temporary sibling so a crash
/// mid-write never leaves a truncated document behind.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored session. A missing file is an empty store.
    pub async fn load_all(&self) -> Result<Vec<FocusSession>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Appends already-stored sessions, e.g. demo history.
    pub async fn extend(&self, sessions: Vec<FocusSession>) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let count = sessions.len();
        let mut all = self.load_all().await?;
        all.extend(sessions);
        self.write_all(&all).await?;
        Ok(count)
    }

    async fn write_all(&self, sessions: &[FocusSession]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(sessions)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), count = sessions.len(), "wrote session file");
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    async fn save(&self, input: FocusSessionInput) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().await;

        let id = format!("session-{}", Uuid::new_v4());
        let mut all = self.load_all().await?;
        all.push(FocusSession::from_input(id.clone(), input, self.clock.now()));
        self.write_all(&all).await?;
        Ok(id)
    }

    async fn query(&self, query: SessionQuery) -> Result<Vec<FocusSession>, StoreError> {
        let all = self.load_all().await?;
        Ok(query.apply(&all))
    }
}
