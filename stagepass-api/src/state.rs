use stagepass_booking::BookingOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: BookingOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: BookingOrchestrator) -> Self {
        Self { orchestrator }
    }
}
