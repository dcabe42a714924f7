use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use stagepass_booking::{BookingOutcome, BookingState};
use stagepass_core::prompt::PresetAnswer;
use stagepass_shared::{BookingRecord, Event, Masked, RemoteBookingDocument};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub event: Event,
    pub user_id: String,
    /// Answer to "book it again?" when the event was booked recently.
    #[serde(default)]
    pub reconfirm: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub outcome: BookingState,
    pub record_id: Option<i64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&BookingOutcome> for BookingResponse {
    fn from(outcome: &BookingOutcome) -> Self {
        let error = match outcome {
            BookingOutcome::Aborted { error } => Some(error.to_string()),
            _ => None,
        };
        Self {
            outcome: outcome.state(),
            record_id: outcome.record_id(),
            message: outcome.message().to_string(),
            error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyBookedResponse {
    pub event_id: String,
    pub recently_booked: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/bookings",
            get(list_bookings).post(create_booking).delete(clear_bookings),
        )
        .route("/v1/bookings/stream", get(booking_stream))
        .route("/v1/users/{user_id}/bookings", get(user_bookings))
        .route("/v1/events/{event_id}/recent", get(recently_booked))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    info!(
        "Booking {} for {}",
        req.event.name,
        Masked(req.user_id.as_str())
    );

    let prompt = PresetAnswer(req.reconfirm);
    let outcome = state
        .orchestrator
        .book(&req.event, &req.user_id, &prompt)
        .await
        .ok_or_else(|| {
            AppError::ConflictError(format!(
                "You've already booked {} recently. Resend with reconfirm to book it again.",
                req.event.name
            ))
        })?;

    let status = match outcome {
        BookingOutcome::Aborted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };
    Ok((status, Json(BookingResponse::from(&outcome))))
}

/// GET /v1/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingRecord>>, AppError> {
    Ok(Json(state.orchestrator.history().await?))
}

/// DELETE /v1/bookings
pub async fn clear_bookings(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.orchestrator.clear_history().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/users/{user_id}/bookings
///
/// An unreachable remote store reads as no bookings.
pub async fn user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<RemoteBookingDocument>> {
    Json(state.orchestrator.remote_bookings(&user_id).await)
}

/// GET /v1/events/{event_id}/recent
pub async fn recently_booked(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Json<RecentlyBookedResponse> {
    let recently_booked = state.orchestrator.guard().was_recently_booked(&event_id);
    Json(RecentlyBookedResponse {
        event_id,
        recently_booked,
    })
}

/// GET /v1/bookings/stream
pub async fn booking_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, axum::Error>>> {
    let stream = state
        .orchestrator
        .events()
        .subscribe()
        .into_stream()
        .map(|event| SseEvent::default().event("booking_completed").json_data(&event));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
