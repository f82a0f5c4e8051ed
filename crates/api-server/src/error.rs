//! Translation of engine failures into HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shelfwise_core::ShelfError;
use tracing::{debug, error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Wraps a [`ShelfError`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub ShelfError);

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self(ShelfError::InvalidParameter(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            ShelfError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ShelfError> for ApiError {
    fn from(e: ShelfError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                metrics::counter!("api.errors", "kind" => kind).increment(1);
                error!(error = %self.0, kind, "Request failed");
                "Internal processing error".to_string()
            }
            StatusCode::NOT_FOUND => {
                metrics::counter!("api.not_found", "kind" => kind).increment(1);
                debug!(error = %self.0, kind, "Nothing to serve");
                self.0.to_string()
            }
            _ => {
                metrics::counter!("api.validation_errors").increment(1);
                warn!(error = %self.0, "Request validation failed");
                self.0.to_string()
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: kind.to_string(),
                message,
            }),
        )
            .into_response()
    }
}
