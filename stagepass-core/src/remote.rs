use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stagepass_shared::RemoteBookingDocument;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::repository::RemoteBookingStore;

/// In-process remote store. Used by tests and by the service when no Redis
/// endpoint is configured. `set_available(false)` simulates an outage.
pub struct InMemoryRemoteStore {
    documents: Mutex<Vec<(String, RemoteBookingDocument)>>,
    available: AtomicBool,
    attempts: AtomicUsize,
    clock: Arc<dyn Clock>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            attempts: AtomicUsize::new(0),
            clock,
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of insert calls received, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, RemoteBookingDocument)>> {
        self.documents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteBookingStore for InMemoryRemoteStore {
    async fn insert(
        &self,
        document: &RemoteBookingDocument,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err("remote store unavailable".into());
        }

        let id = Uuid::new_v4().simple().to_string();
        let mut stored = document.clone();
        stored.server_timestamp = Some(self.clock.now());
        self.lock().push((id.clone(), stored));
        Ok(id)
    }

    async fn find_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<RemoteBookingDocument>, Box<dyn std::error::Error + Send + Sync>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err("remote store unavailable".into());
        }

        let mut matches: Vec<RemoteBookingDocument> = self
            .lock()
            .iter()
            .filter(|(_, doc)| doc.user_id == user_id)
            .map(|(_, doc)| doc.clone())
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        matches.sort_by_key(|doc| doc.server_timestamp);
        Ok(matches)
    }
}
