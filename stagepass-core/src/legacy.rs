use std::collections::VecDeque;
use std::sync::Mutex;
use stagepass_shared::Event;

pub const DEFAULT_CAPACITY: usize = 10;

/// The pre-database booking history. Written on every confirm and cleared with
/// the main history; it never gates a booking.
pub trait LegacyCache: Send + Sync {
    fn add(&self, event: &Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn clear_all(&self);
}

/// Most-recent-first list of booked events, de-duplicated by event name and
/// bounded to `capacity` entries.
pub struct RecentBookingsCache {
    entries: Mutex<VecDeque<Event>>,
    capacity: usize,
}

impl RecentBookingsCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn recent(&self) -> Vec<Event> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Event>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RecentBookingsCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LegacyCache for RecentBookingsCache {
    fn add(&self, event: &Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.capacity == 0 {
            return Ok(());
        }
        let mut entries = self.lock();
        entries.retain(|e| e.name != event.name);
        entries.push_front(event.clone());
        entries.truncate(self.capacity);
        Ok(())
    }

    fn clear_all(&self) {
        self.lock().clear();
    }
}
