use serde::{Deserialize, Serialize};
use stagepass_core::BookingError;
use tokio::sync::watch;

/// Lifecycle of one booking attempt: `Idle → Saving → {Confirmed | LocalOnly | Aborted}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    Idle,
    Saving,
    /// Saved locally and mirrored remotely
    Confirmed,
    /// Saved locally, remote write failed
    LocalOnly,
    /// Local write failed, nothing saved
    Aborted,
}

impl BookingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::LocalOnly | Self::Aborted)
    }

    pub fn can_transition_to(&self, next: BookingState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Saving)
                | (Self::Saving, Self::Confirmed)
                | (Self::Saving, Self::LocalOnly)
                | (Self::Saving, Self::Aborted)
        )
    }
}

/// Result of one booking attempt, as surfaced to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Confirmed { record_id: i64 },
    LocalOnly { record_id: i64 },
    Aborted { error: BookingError },
}

impl BookingOutcome {
    pub fn state(&self) -> BookingState {
        match self {
            Self::Confirmed { .. } => BookingState::Confirmed,
            Self::LocalOnly { .. } => BookingState::LocalOnly,
            Self::Aborted { .. } => BookingState::Aborted,
        }
    }

    /// Local record id, present whenever the booking was saved.
    pub fn record_id(&self) -> Option<i64> {
        match self {
            Self::Confirmed { record_id } | Self::LocalOnly { record_id } => Some(*record_id),
            Self::Aborted { .. } => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Confirmed { .. } => "Booking confirmed and saved to cloud!",
            Self::LocalOnly { .. } => "Booking saved locally, but failed to sync to cloud",
            Self::Aborted { .. } => "Booking could not be saved",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid booking state transition from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: BookingState,
    pub to: BookingState,
}

/// Progress signal of one booking attempt.
///
/// Backed by a watch channel. Updates are still applied when every receiver
/// is gone, so a caller that stops listening never stalls or fails the flow.
#[derive(Debug)]
pub struct BookingProgress {
    tx: watch::Sender<BookingState>,
}

impl BookingProgress {
    pub fn new() -> (Self, watch::Receiver<BookingState>) {
        let (tx, rx) = watch::channel(BookingState::Idle);
        (Self { tx }, rx)
    }

    /// Progress nobody observes.
    pub fn detached() -> Self {
        let (progress, _) = Self::new();
        progress
    }

    pub fn state(&self) -> BookingState {
        *self.tx.borrow()
    }

    pub fn advance(&self, next: BookingState) -> Result<(), TransitionError> {
        let from = self.state();
        if !from.can_transition_to(next) {
            return Err(TransitionError { from, to: next });
        }
        self.tx.send_replace(next);
        Ok(())
    }
}
