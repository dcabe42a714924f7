pub mod booking;
pub mod event;
pub mod events;
pub mod remote;

pub use booking::{format_booking_time, BookingRecord, BOOKING_TIME_FORMAT};
pub use event::Event;
pub use events::BookingCompletedEvent;
pub use remote::RemoteBookingDocument;
