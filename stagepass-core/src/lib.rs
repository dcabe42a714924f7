pub mod clock;
pub mod legacy;
pub mod notify;
pub mod prompt;
pub mod remote;
pub mod repository;
pub mod sms;

pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{BookingRepository, RemoteBookingStore};

/// Failure taxonomy of the booking flow.
///
/// Only `LocalWriteFailure` ever aborts a booking. The remote and side-effect
/// variants are caught at their own boundary and logged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("Local booking write failed: {0}")]
    LocalWriteFailure(String),
    #[error("Local booking read failed: {0}")]
    LocalReadFailure(String),
    #[error("Remote booking write failed: {0}")]
    RemoteWriteFailure(String),
    #[error("Remote booking query failed: {0}")]
    RemoteQueryFailure(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Event id {0:?} collides with other events under the dedup key")]
    DegenerateIdentifier(String),
    #[error("Side effect failed: {0}")]
    SideEffectFailure(String),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Flags event ids that would share one dedup key with unrelated events.
pub fn validate_event_id(event_id: &str) -> BookingResult<()> {
    if event_id.trim().is_empty() {
        return Err(BookingError::DegenerateIdentifier(event_id.to_string()));
    }
    Ok(())
}
