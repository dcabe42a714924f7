use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-width timestamp format for `booking_time`. Lexical order of strings in
/// this format matches chronological order.
pub const BOOKING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_booking_time(at: DateTime<Utc>) -> String {
    at.format(BOOKING_TIME_FORMAT).to_string()
}

/// A confirmed booking as persisted in the local store. Never updated once
/// written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: i64,
    pub event_name: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub price: f64,
    pub booking_time: String,
}
