use stagepass_core::{BookingError, Clock, RemoteBookingStore};
use stagepass_shared::{format_booking_time, Event, Masked, RemoteBookingDocument};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Mirrors bookings to the remote store. Stateless apart from its handles:
/// one call, one attempt, no retries.
#[derive(Clone)]
pub struct RemoteSyncClient {
    store: Arc<dyn RemoteBookingStore>,
    clock: Arc<dyn Clock>,
}

/// An in-flight remote write. Resolves exactly once, to whether the document
/// was stored. Dropping it does not cancel the write.
pub struct RemoteWrite {
    handle: JoinHandle<bool>,
}

impl Future for RemoteWrite {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(stored)) => Poll::Ready(stored),
            Poll::Ready(Err(e)) => {
                error!("Remote booking write task failed: {}", e);
                Poll::Ready(false)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl RemoteSyncClient {
    pub fn new(store: Arc<dyn RemoteBookingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Submits the booking document on its own task and returns immediately.
    pub fn save(&self, event: &Event, user_id: &str) -> RemoteWrite {
        let booking_time = format_booking_time(self.clock.now());
        let document = RemoteBookingDocument::new(event, user_id, &booking_time);
        let store = Arc::clone(&self.store);
        let user = Masked(user_id.to_string());

        let handle = tokio::spawn(async move {
            match store.insert(&document).await {
                Ok(id) => {
                    info!("Booking for {} mirrored remotely as {}", user, id);
                    true
                }
                Err(e) => {
                    error!("Error saving booking for {}: {}", user, e);
                    false
                }
            }
        });

        RemoteWrite { handle }
    }

    /// The user's remote bookings, oldest first. Any failure yields an empty
    /// list, indistinguishable from having no bookings.
    pub async fn list_for_user(&self, user_id: &str) -> Vec<RemoteBookingDocument> {
        match self.store.find_by_user(user_id).await {
            Ok(documents) => documents,
            Err(e) => {
                let failure = BookingError::RemoteQueryFailure(e.to_string());
                error!("Error getting user bookings: {}", failure);
                Vec::new()
            }
        }
    }
}
