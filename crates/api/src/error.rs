//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking::BookingError;
use thiserror::Error;
use wizard::WizardError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// The requested feature is switched off.
    #[error("{0}")]
    Forbidden(String),
    /// Step store or session error.
    #[error(transparent)]
    Wizard(#[from] WizardError),
    /// Booking page action error.
    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl ApiError {
    /// Returns the status code and message sent to the client.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Wizard(err) => (wizard_status(err), err.to_string()),
            ApiError::Booking(err) => (booking_status(err), err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn wizard_status(err: &WizardError) -> StatusCode {
    match err {
        WizardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        WizardError::MissingPrerequisite { .. } => StatusCode::CONFLICT,
        WizardError::InvalidStepPath { .. } | WizardError::UnknownFlow(_) => {
            StatusCode::BAD_REQUEST
        }
        WizardError::EmptyRegistry | WizardError::DuplicateStepPath(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn booking_status(err: &BookingError) -> StatusCode {
    match err {
        BookingError::Wizard(inner) => wizard_status(inner),
        BookingError::InvalidInput(_) | BookingError::Wallet(_) => StatusCode::BAD_REQUEST,
        BookingError::BookingNotFound(_) => StatusCode::NOT_FOUND,
        BookingError::BookingApi(_) => StatusCode::BAD_GATEWAY,
        BookingError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
