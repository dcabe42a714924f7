use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Event;

/// Booking document mirrored to the remote store.
///
/// `server_timestamp` is `None` on the way out; the remote store assigns it
/// from its own clock and it orders per-user listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBookingDocument {
    pub user_id: String,
    pub event_name: String,
    pub event_date: String,
    pub event_time: String,
    pub venue: String,
    pub price: f64,
    pub artist: String,
    pub category: String,
    pub booking_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl RemoteBookingDocument {
    pub fn new(event: &Event, user_id: &str, booking_time: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            event_name: event.name.clone(),
            event_date: event.date.clone(),
            event_time: event.time.clone(),
            venue: event.venue.clone(),
            price: event.price,
            artist: event.artist.clone(),
            category: event.category.clone(),
            booking_time: booking_time.to_string(),
            server_timestamp: None,
        }
    }
}
