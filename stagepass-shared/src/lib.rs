pub mod models;
pub mod pii;

pub use models::{
    format_booking_time, BookingCompletedEvent, BookingRecord, Event, RemoteBookingDocument,
    BOOKING_TIME_FORMAT,
};
pub use pii::Masked;
