use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stagepass_core::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ConflictError(String),
    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::Booking(err) => {
                tracing::error!("Booking store error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
