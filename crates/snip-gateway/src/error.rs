use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use snip_core::ShortenerError;
use tracing::{error, warn};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

/// A [`ShortenerError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct AppError(ShortenerError);

impl AppError {
    /// Status code and stable error name for the wire.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            ShortenerError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "InvalidUrl"),
            ShortenerError::InvalidShortCode(_) => (StatusCode::BAD_REQUEST, "InvalidShortCode"),
            ShortenerError::AliasConflict(_) => (StatusCode::CONFLICT, "AliasConflict"),
            ShortenerError::CodeNotFound(_) => (StatusCode::NOT_FOUND, "CodeNotFound"),
            ShortenerError::GenerationExhausted { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GenerationExhausted")
            }
            ShortenerError::StorageUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "StorageUnavailable")
            }
            ShortenerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StorageError"),
        }
    }
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        Self(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self(ShortenerError::InvalidUrl(value.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.classify();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else if status != StatusCode::NOT_FOUND {
            warn!(error = %self.0, "request rejected");
        }

        let body = ErrorResponse {
            error,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
