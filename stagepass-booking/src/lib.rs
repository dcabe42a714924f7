pub mod events;
pub mod guard;
pub mod models;
pub mod orchestrator;
pub mod remote_sync;

pub use events::{BookingEventBus, Subscription};
pub use guard::{DuplicateBookingGuard, GuardListener, DEDUP_WINDOW_HOURS};
pub use models::{BookingOutcome, BookingProgress, BookingState, TransitionError};
pub use orchestrator::BookingOrchestrator;
pub use remote_sync::{RemoteSyncClient, RemoteWrite};
