use stagepass_shared::Event;
use tracing::info;

pub const CONFIRMED_TITLE: &str = "Booking Confirmed";

/// Posts the "booking confirmed" notification. Called once per confirmed
/// booking; failures are logged by the caller and never change the outcome.
pub trait Notifier: Send + Sync {
    fn post_booking_confirmed(
        &self,
        event: &Event,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub fn confirmation_text(event: &Event) -> String {
    format!(
        "Your booking for {} on {} at {} has been confirmed!",
        event.name, event.date, event.time
    )
}

/// Emits notifications as structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn post_booking_confirmed(
        &self,
        event: &Event,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            title = CONFIRMED_TITLE,
            venue = %event.venue,
            "{}",
            confirmation_text(event)
        );
        Ok(())
    }
}
