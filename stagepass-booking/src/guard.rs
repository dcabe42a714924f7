use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use stagepass_core::prompt::ConfirmationPrompt;
use stagepass_core::{validate_event_id, Clock};
use stagepass_shared::Event;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::BookingEventBus;

/// Length of the window in which a repeat booking asks for reconfirmation.
pub const DEDUP_WINDOW_HOURS: i64 = 24;

/// Remembers when each event was last booked in this session and asks for
/// reconfirmation before a repeat booking inside the dedup window.
///
/// Entries are never evicted: they stop counting as recent once the window
/// has passed but stay in memory for the life of the guard. The map is shared
/// by every booking flow holding the guard's `Arc`.
pub struct DuplicateBookingGuard {
    booked: DashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl DuplicateBookingGuard {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            booked: DashMap::new(),
            clock,
            window: Duration::hours(DEDUP_WINDOW_HOURS),
        }
    }

    pub fn was_recently_booked(&self, event_id: &str) -> bool {
        let Some(booked_at) = self.booked.get(event_id).map(|entry| *entry.value()) else {
            return false;
        };
        self.clock.now() - booked_at < self.window
    }

    pub fn record_booking(&self, event_id: &str) {
        flag_degenerate(event_id);
        let now = self.clock.now();
        self.booked.insert(event_id.to_string(), now);
        debug!("Recorded booking of event {:?} at {}", event_id, now);
    }

    /// Number of events ever recorded, recent or not.
    pub fn tracked(&self) -> usize {
        self.booked.len()
    }

    /// Runs `proceed` unless the event was booked recently and the user
    /// declines to book it again. Returns `None` when declined; the guard's
    /// state is untouched either way.
    pub async fn check_and_confirm<F, Fut, T>(
        &self,
        event: &Event,
        prompt: &dyn ConfirmationPrompt,
        proceed: F,
    ) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if event.has_degenerate_id() {
            warn!(
                "{} has no usable id and shares its dedup entry with other such events",
                event.name
            );
        }

        if self.was_recently_booked(&event.id) {
            let message = format!(
                "You've already booked {} recently. Are you sure you want to book it again?",
                event.name
            );
            if !prompt.confirm("Already Booked", &message).await {
                info!("Repeat booking of {} declined", event.name);
                return None;
            }
        }

        Some(proceed().await)
    }

    /// Records every booking published on `bus` until the returned listener is
    /// dropped.
    pub fn attach(self: &Arc<Self>, bus: &BookingEventBus) -> GuardListener {
        let guard = Arc::clone(self);
        let mut subscription = bus.subscribe();
        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                guard.record_booking(&event.event_id);
                info!(
                    "You've booked {}. This will be remembered to prevent duplicate bookings.",
                    event.event_name
                );
            }
        });
        GuardListener { handle }
    }
}

fn flag_degenerate(event_id: &str) {
    if let Err(e) = validate_event_id(event_id) {
        warn!("{}; unrelated events will share its dedup entry", e);
    }
}

/// Keeps the guard subscribed to booking notices. Dropping it unsubscribes.
pub struct GuardListener {
    handle: JoinHandle<()>,
}

impl Drop for GuardListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
