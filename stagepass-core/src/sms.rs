use async_trait::async_trait;
use stagepass_shared::{Event, Masked};
use tracing::info;

use crate::{BookingError, BookingResult};

/// Sends the booking confirmation text message.
///
/// Sending is gated by `has_permission`, independent of the booking outcome:
/// a denied or failed SMS never un-confirms a booking.
#[async_trait]
pub trait SmsDispatcher: Send + Sync {
    fn has_permission(&self) -> bool;

    /// Send to `destination`, or to the dispatcher's default number when
    /// `None`.
    async fn send_confirmation(&self, event: &Event, destination: Option<&str>)
        -> BookingResult<()>;
}

pub fn confirmation_message(event: &Event) -> String {
    format!(
        "Booking Confirmed!\nEvent: {}\nDate: {}\nTime: {}\nVenue: {}\nThank you for your booking!",
        event.name, event.date, event.time, event.venue
    )
}

/// SMS gateway that logs outgoing messages instead of handing them to a
/// carrier. Permission comes from configuration.
#[derive(Debug, Clone)]
pub struct LogSmsGateway {
    enabled: bool,
    default_destination: String,
}

impl LogSmsGateway {
    pub fn new(enabled: bool, default_destination: impl Into<String>) -> Self {
        Self {
            enabled,
            default_destination: default_destination.into(),
        }
    }
}

#[async_trait]
impl SmsDispatcher for LogSmsGateway {
    fn has_permission(&self) -> bool {
        self.enabled
    }

    async fn send_confirmation(
        &self,
        event: &Event,
        destination: Option<&str>,
    ) -> BookingResult<()> {
        if !self.enabled {
            return Err(BookingError::PermissionDenied(
                "SMS permission not granted. SMS notification not sent.".to_string(),
            ));
        }

        let to = Masked(destination.unwrap_or(&self.default_destination));
        let message = confirmation_message(event);
        info!(destination = %to, chars = message.len(), "Booking confirmation SMS sent");
        Ok(())
    }
}
