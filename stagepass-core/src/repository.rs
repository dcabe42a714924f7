use async_trait::async_trait;
use stagepass_shared::{BookingRecord, Event, RemoteBookingDocument};

use crate::BookingResult;

/// Durable local persistence of confirmed bookings.
///
/// Every call is self-contained: implementations acquire storage for the one
/// statement and release it before returning.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Append one booking row and return its store-assigned id.
    /// Storage rejections surface as `LocalWriteFailure`.
    async fn save(&self, event: &Event, booking_time: &str) -> BookingResult<i64>;

    /// All bookings, most recent `booking_time` first.
    async fn list_all(&self) -> BookingResult<Vec<BookingRecord>>;

    /// Delete every booking. Irreversible.
    async fn clear_all(&self) -> BookingResult<()>;
}

/// Transport to the remote document store that mirrors bookings.
#[async_trait]
pub trait RemoteBookingStore: Send + Sync {
    /// Store a booking document, returning the remote document id. The store
    /// assigns `server_timestamp`.
    async fn insert(
        &self,
        document: &RemoteBookingDocument,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Documents for one user, oldest `server_timestamp` first.
    async fn find_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<RemoteBookingDocument>, Box<dyn std::error::Error + Send + Sync>>;
}
