//! In-process publish/subscribe for booking-completed notices.
//!
//! Delivery is best-effort: publishing with no subscribers is not an error,
//! and a subscriber that falls more than the channel capacity behind skips the
//! notices it missed. A subscription lives exactly as long as its
//! [`Subscription`] value.

use stagepass_shared::BookingCompletedEvent;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct BookingEventBus {
    tx: broadcast::Sender<BookingCompletedEvent>,
}

impl BookingEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Returns how many subscribers the notice was delivered to.
    pub fn publish(&self, event: BookingCompletedEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BookingEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<BookingCompletedEvent>,
}

impl Subscription {
    /// Next notice, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<BookingCompletedEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Booking subscriber lagged, skipped {} notices", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published notice, without waiting.
    pub fn try_recv(&mut self) -> Option<BookingCompletedEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Booking subscriber lagged, skipped {} notices", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = BookingCompletedEvent> + Send + 'static {
        BroadcastStream::new(self.rx).filter_map(|result| result.ok())
    }

    pub fn unsubscribe(self) {}
}
