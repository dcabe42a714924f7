/// Published in-process once a booking is saved and synced.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingCompletedEvent {
    pub event_id: String,
    pub event_name: String,
}

impl BookingCompletedEvent {
    pub fn for_event(event: &crate::Event) -> Self {
        Self {
            event_id: event.id.clone(),
            event_name: event.name.clone(),
        }
    }
}
