use stagepass_core::legacy::{LegacyCache, RecentBookingsCache};
use stagepass_core::notify::{LogNotifier, Notifier};
use stagepass_core::prompt::ConfirmationPrompt;
use stagepass_core::sms::{LogSmsGateway, SmsDispatcher};
use stagepass_core::{BookingError, BookingRepository, BookingResult, Clock};
use stagepass_shared::{
    format_booking_time, BookingCompletedEvent, BookingRecord, Event, Masked, RemoteBookingDocument,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::events::BookingEventBus;
use crate::guard::DuplicateBookingGuard;
use crate::models::{BookingOutcome, BookingProgress, BookingState};
use crate::remote_sync::RemoteSyncClient;

/// Runs one booking from confirmation to outcome.
///
/// The local write is the only step that can fail a booking. The remote
/// mirror decides between `Confirmed` and `LocalOnly`, and every other step is
/// best-effort: its failure is logged and never rolls back an earlier step.
#[derive(Clone)]
pub struct BookingOrchestrator {
    store: Arc<dyn BookingRepository>,
    remote: RemoteSyncClient,
    guard: Arc<DuplicateBookingGuard>,
    bus: BookingEventBus,
    clock: Arc<dyn Clock>,
    legacy: Arc<dyn LegacyCache>,
    notifier: Arc<dyn Notifier>,
    sms: Arc<dyn SmsDispatcher>,
}

impl BookingOrchestrator {
    /// Uses an in-memory legacy cache, log notifications and a disabled SMS
    /// gateway until replaced with the `with_*` methods.
    pub fn new(
        store: Arc<dyn BookingRepository>,
        remote: RemoteSyncClient,
        guard: Arc<DuplicateBookingGuard>,
        bus: BookingEventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            remote,
            guard,
            bus,
            clock,
            legacy: Arc::new(RecentBookingsCache::default()),
            notifier: Arc::new(LogNotifier),
            sms: Arc::new(LogSmsGateway::new(false, "")),
        }
    }

    pub fn with_legacy_cache(mut self, legacy: Arc<dyn LegacyCache>) -> Self {
        self.legacy = legacy;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_sms(mut self, sms: Arc<dyn SmsDispatcher>) -> Self {
        self.sms = sms;
        self
    }

    pub fn guard(&self) -> &Arc<DuplicateBookingGuard> {
        &self.guard
    }

    pub fn events(&self) -> &BookingEventBus {
        &self.bus
    }

    /// Local booking history, newest first.
    pub async fn history(&self) -> BookingResult<Vec<BookingRecord>> {
        self.store.list_all().await
    }

    /// Clears the local history, then the legacy cache. The dedup guard keeps
    /// its entries.
    pub async fn clear_history(&self) -> BookingResult<()> {
        self.store.clear_all().await?;
        self.legacy.clear_all();
        info!("Booking history cleared");
        Ok(())
    }

    pub async fn remote_bookings(&self, user_id: &str) -> Vec<RemoteBookingDocument> {
        self.remote.list_for_user(user_id).await
    }

    /// Asks for reconfirmation when the event was booked recently, then
    /// confirms. `None` means the user declined and nothing happened.
    pub async fn book(
        &self,
        event: &Event,
        user_id: &str,
        prompt: &dyn ConfirmationPrompt,
    ) -> Option<BookingOutcome> {
        self.guard
            .check_and_confirm(event, prompt, || self.confirm(event, user_id))
            .await
    }

    pub async fn confirm(&self, event: &Event, user_id: &str) -> BookingOutcome {
        self.confirm_with_progress(event, user_id, BookingProgress::detached())
            .await
    }

    /// Confirms a booking, reporting state changes through `progress`.
    ///
    /// Once the local write has succeeded the rest of the flow runs on its own
    /// task: dropping this future (the caller went away) does not stop the
    /// remote write or the side effects that follow it.
    pub async fn confirm_with_progress(
        &self,
        event: &Event,
        user_id: &str,
        progress: BookingProgress,
    ) -> BookingOutcome {
        advance(&progress, BookingState::Saving);
        let booking_time = format_booking_time(self.clock.now());

        if let Err(e) = self.legacy.add(event) {
            warn!("Legacy booking history write failed for {}: {}", event.name, e);
        }

        let record_id = match self.store.save(event, &booking_time).await {
            Ok(id) => id,
            Err(error) => {
                error!("Booking of {} aborted: {}", event.name, error);
                advance(&progress, BookingState::Aborted);
                return BookingOutcome::Aborted { error };
            }
        };

        let write = self.remote.save(event, user_id);
        let this = self.clone();
        let event = event.clone();
        let user = Masked(user_id.to_string());

        let continuation = tokio::spawn(async move {
            let outcome = if write.await {
                this.on_synced(&event).await;
                BookingOutcome::Confirmed { record_id }
            } else {
                let failure = BookingError::RemoteWriteFailure(format!(
                    "booking {} for {}",
                    record_id, user
                ));
                warn!("{}; kept locally only", failure);
                BookingOutcome::LocalOnly { record_id }
            };
            advance(&progress, outcome.state());
            outcome
        });

        match continuation.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Booking continuation for record {} failed: {}", record_id, e);
                BookingOutcome::LocalOnly { record_id }
            }
        }
    }

    async fn on_synced(&self, event: &Event) {
        self.guard.record_booking(&event.id);

        if let Err(e) = self.notifier.post_booking_confirmed(event) {
            warn!("{}", BookingError::SideEffectFailure(format!("notification: {}", e)));
        }

        self.send_sms(event).await;

        let delivered = self.bus.publish(BookingCompletedEvent::for_event(event));
        debug!("Booking of {} published to {} subscribers", event.name, delivered);
        info!("Booking of {} confirmed", event.name);
    }

    async fn send_sms(&self, event: &Event) {
        if !self.sms.has_permission() {
            let denied = BookingError::PermissionDenied(
                "SMS permission required to send booking confirmation".to_string(),
            );
            warn!("{}", denied);
            return;
        }
        if let Err(e) = self.sms.send_confirmation(event, None).await {
            warn!("Failed to send SMS: {}", e);
        }
    }
}

fn advance(progress: &BookingProgress, next: BookingState) {
    if let Err(e) = progress.advance(next) {
        warn!("{}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use stagepass_core::prompt::PresetAnswer;
    use stagepass_core::remote::InMemoryRemoteStore;
    use stagepass_core::{ManualClock, RemoteBookingStore};
    use stagepass_store::BookingStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingNotifier {
        posted: AtomicUsize,
    }

    impl Notifier for CountingNotifier {
        fn post_booking_confirmed(
            &self,
            _event: &Event,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.posted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingSms {
        permitted: bool,
        sent: AtomicUsize,
    }

    #[async_trait]
    impl SmsDispatcher for CountingSms {
        fn has_permission(&self) -> bool {
            self.permitted
        }

        async fn send_confirmation(
            &self,
            _event: &Event,
            _destination: Option<&str>,
        ) -> BookingResult<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl BookingRepository for FailingStore {
        async fn save(&self, _event: &Event, _booking_time: &str) -> BookingResult<i64> {
            Err(BookingError::LocalWriteFailure("database or disk is full".to_string()))
        }

        async fn list_all(&self) -> BookingResult<Vec<BookingRecord>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BookingResult<()> {
            Ok(())
        }
    }

    /// Holds every insert until the gate is opened.
    struct GatedRemote {
        gate: Notify,
        entered: AtomicUsize,
        inner: InMemoryRemoteStore,
    }

    #[async_trait]
    impl RemoteBookingStore for GatedRemote {
        async fn insert(
            &self,
            document: &RemoteBookingDocument,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            self.entered.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.inner.insert(document).await
        }

        async fn find_by_user(
            &self,
            user_id: &str,
        ) -> Result<Vec<RemoteBookingDocument>, Box<dyn std::error::Error + Send + Sync>> {
            self.inner.find_by_user(user_id).await
        }
    }

    struct Harness {
        orchestrator: BookingOrchestrator,
        store: Arc<dyn BookingRepository>,
        remote: Arc<InMemoryRemoteStore>,
        notifier: Arc<CountingNotifier>,
        sms: Arc<CountingSms>,
        bus: BookingEventBus,
        clock: Arc<ManualClock>,
    }

    async fn sqlite_store() -> Arc<dyn BookingRepository> {
        let store = BookingStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        Arc::new(store)
    }

    fn harness(store: Arc<dyn BookingRepository>, sms_permitted: bool) -> Harness {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()));
        let remote = Arc::new(InMemoryRemoteStore::with_clock(clock.clone()));
        let notifier = Arc::new(CountingNotifier::default());
        let sms = Arc::new(CountingSms {
            permitted: sms_permitted,
            sent: AtomicUsize::new(0),
        });
        let bus = BookingEventBus::default();
        let guard = Arc::new(DuplicateBookingGuard::new(clock.clone()));

        let orchestrator = BookingOrchestrator::new(
            store.clone(),
            RemoteSyncClient::new(remote.clone(), clock.clone()),
            guard,
            bus.clone(),
            clock.clone(),
        )
        .with_notifier(notifier.clone())
        .with_sms(sms.clone());

        Harness {
            orchestrator,
            store,
            remote,
            notifier,
            sms,
            bus,
            clock,
        }
    }

    fn event() -> Event {
        Event {
            id: "evt-rock-2024".to_string(),
            name: "Rock Festival 2024".to_string(),
            artist: "Various Artists".to_string(),
            date: "2025-02-02".to_string(),
            time: "16:00".to_string(),
            venue: "Open Air Arena".to_string(),
            price: 89.0,
            image_url: String::new(),
            category: "Music".to_string(),
            available_seats: 500,
            description: "All-day festival".to_string(),
        }
    }

    #[tokio::test]
    async fn test_saved_and_synced_booking_is_confirmed() {
        let h = harness(sqlite_store().await, true);
        let mut completed = h.bus.subscribe();
        let (progress, state) = BookingProgress::new();

        let outcome = h
            .orchestrator
            .confirm_with_progress(&event(), "user_1", progress)
            .await;

        assert!(matches!(outcome, BookingOutcome::Confirmed { .. }));
        assert_eq!(*state.borrow(), BookingState::Confirmed);
        assert!(h.orchestrator.guard().was_recently_booked("evt-rock-2024"));
        assert_eq!(h.notifier.posted.load(Ordering::SeqCst), 1);
        assert_eq!(h.sms.sent.load(Ordering::SeqCst), 1);
        assert_eq!(
            completed.try_recv(),
            Some(BookingCompletedEvent {
                event_id: "evt-rock-2024".to_string(),
                event_name: "Rock Festival 2024".to_string(),
            })
        );
        assert_eq!(completed.try_recv(), None);

        let records = h.store.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(Some(records[0].id), outcome.record_id());
        assert_eq!(records[0].booking_time, "2024-01-01 10:00:00");
        assert_eq!(h.remote.len(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_booking_local_only() {
        let h = harness(sqlite_store().await, true);
        h.remote.set_available(false);
        let mut completed = h.bus.subscribe();

        let outcome = h.orchestrator.confirm(&event(), "user_1").await;

        assert!(matches!(outcome, BookingOutcome::LocalOnly { .. }));
        assert!(!h.orchestrator.guard().was_recently_booked("evt-rock-2024"));
        assert_eq!(h.notifier.posted.load(Ordering::SeqCst), 0);
        assert_eq!(h.sms.sent.load(Ordering::SeqCst), 0);
        assert_eq!(completed.try_recv(), None);
        assert_eq!(h.remote.attempts(), 1);

        let records = h.store.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_name, "Rock Festival 2024");
    }

    #[tokio::test]
    async fn test_local_failure_aborts_before_remote() {
        let h = harness(Arc::new(FailingStore), true);
        let mut completed = h.bus.subscribe();
        let (progress, state) = BookingProgress::new();

        let outcome = h
            .orchestrator
            .confirm_with_progress(&event(), "user_1", progress)
            .await;

        assert_eq!(
            outcome,
            BookingOutcome::Aborted {
                error: BookingError::LocalWriteFailure("database or disk is full".to_string()),
            }
        );
        assert_eq!(*state.borrow(), BookingState::Aborted);
        assert_eq!(h.remote.attempts(), 0);
        assert!(h.remote.is_empty());
        assert_eq!(h.notifier.posted.load(Ordering::SeqCst), 0);
        assert_eq!(h.sms.sent.load(Ordering::SeqCst), 0);
        assert_eq!(completed.try_recv(), None);
        assert!(!h.orchestrator.guard().was_recently_booked("evt-rock-2024"));
    }

    #[tokio::test]
    async fn test_closed_database_aborts() {
        let store = BookingStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store.close().await;
        let h = harness(Arc::new(store), true);

        let outcome = h.orchestrator.confirm(&event(), "user_1").await;

        assert!(matches!(
            outcome,
            BookingOutcome::Aborted {
                error: BookingError::LocalWriteFailure(_)
            }
        ));
        assert_eq!(h.remote.attempts(), 0);
    }

    #[tokio::test]
    async fn test_sms_permission_denied_still_confirms() {
        let h = harness(sqlite_store().await, false);

        let outcome = h.orchestrator.confirm(&event(), "user_1").await;

        assert!(matches!(outcome, BookingOutcome::Confirmed { .. }));
        assert_eq!(h.sms.sent.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.posted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_declined_repeat_booking_does_nothing() {
        let h = harness(sqlite_store().await, true);
        let first = h.orchestrator.book(&event(), "user_1", &PresetAnswer(false)).await;
        assert!(matches!(first, Some(BookingOutcome::Confirmed { .. })));

        let second = h.orchestrator.book(&event(), "user_1", &PresetAnswer(false)).await;

        assert!(second.is_none());
        assert_eq!(h.store.list_all().await.unwrap().len(), 1);
        assert_eq!(h.remote.attempts(), 1);
        assert_eq!(h.notifier.posted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_accepted_repeat_booking_books_again() {
        let h = harness(sqlite_store().await, true);
        h.orchestrator.book(&event(), "user_1", &PresetAnswer(false)).await;
        h.clock.advance(Duration::hours(1));

        let second = h.orchestrator.book(&event(), "user_1", &PresetAnswer(true)).await;

        assert!(matches!(second, Some(BookingOutcome::Confirmed { .. })));
        let records = h.store.list_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].booking_time, "2024-01-01 11:00:00");
    }

    #[tokio::test]
    async fn test_repeat_after_window_needs_no_reconfirmation() {
        let h = harness(sqlite_store().await, true);
        h.orchestrator.book(&event(), "user_1", &PresetAnswer(false)).await;
        h.clock.advance(Duration::hours(25));

        let second = h.orchestrator.book(&event(), "user_1", &PresetAnswer(false)).await;
        assert!(matches!(second, Some(BookingOutcome::Confirmed { .. })));
    }

    #[tokio::test]
    async fn test_clear_history_empties_legacy_cache_too() {
        let legacy = Arc::new(RecentBookingsCache::default());
        let mut h = harness(sqlite_store().await, true);
        h.orchestrator = h.orchestrator.with_legacy_cache(legacy.clone());

        h.orchestrator.confirm(&event(), "user_1").await;
        assert_eq!(legacy.recent().len(), 1);
        assert_eq!(h.orchestrator.history().await.unwrap().len(), 1);

        h.orchestrator.clear_history().await.unwrap();

        assert!(h.orchestrator.history().await.unwrap().is_empty());
        assert!(legacy.recent().is_empty());
        // Remote copies and the dedup window are untouched.
        assert_eq!(h.orchestrator.remote_bookings("user_1").await.len(), 1);
        assert!(h.orchestrator.guard().was_recently_booked("evt-rock-2024"));
    }

    #[tokio::test]
    async fn test_side_effects_fire_after_caller_goes_away() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()));
        let remote = Arc::new(GatedRemote {
            gate: Notify::new(),
            entered: AtomicUsize::new(0),
            inner: InMemoryRemoteStore::with_clock(clock.clone()),
        });
        let notifier = Arc::new(CountingNotifier::default());
        let bus = BookingEventBus::default();
        let mut completed = bus.subscribe();
        let store = sqlite_store().await;
        let orchestrator = BookingOrchestrator::new(
            store.clone(),
            RemoteSyncClient::new(remote.clone(), clock.clone()),
            Arc::new(DuplicateBookingGuard::new(clock.clone())),
            bus.clone(),
            clock,
        )
        .with_notifier(notifier.clone());

        let (progress, mut state) = BookingProgress::new();
        let caller = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .confirm_with_progress(&event(), "user_1", progress)
                    .await
            })
        };

        // Wait until the local write is done and the remote write is in flight.
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while remote.entered.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
        assert_eq!(*state.borrow(), BookingState::Saving);

        caller.abort();
        remote.gate.notify_one();

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while *state.borrow_and_update() != BookingState::Confirmed {
                state.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        assert_eq!(remote.inner.len(), 1);
        assert_eq!(notifier.posted.load(Ordering::SeqCst), 1);
        assert!(orchestrator.guard().was_recently_booked("evt-rock-2024"));
        assert_eq!(completed.try_recv().map(|e| e.event_id), Some("evt-rock-2024".to_string()));
    }
}
