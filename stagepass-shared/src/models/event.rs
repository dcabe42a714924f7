use serde::{Deserialize, Serialize};

/// A bookable event as shown in the catalogue.
///
/// `id` is the dedup key for repeat-booking detection. The sample catalogue
/// ships events with an empty id, so callers must not assume it is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub artist: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    pub category: String,
    #[serde(default)]
    pub available_seats: u32,
    #[serde(default)]
    pub description: String,
}

impl Event {
    /// True when the id cannot distinguish this event from others under the
    /// dedup key (empty or whitespace only).
    pub fn has_degenerate_id(&self) -> bool {
        self.id.trim().is_empty()
    }
}
