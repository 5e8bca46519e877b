use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use dggforge_core::DggforgeError;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DggforgeError> for ApiError {
    fn from(err: DggforgeError) -> Self {
        let (status, message) = match &err {
            DggforgeError::UnknownGridFamily { .. } => {
                (StatusCode::BAD_REQUEST, "Unknown grid family")
            }
            DggforgeError::InvalidBoundingBox { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid bounding box")
            }
            DggforgeError::ResolutionOutOfRange { .. } => {
                (StatusCode::BAD_REQUEST, "Resolution out of range")
            }
            DggforgeError::UnsupportedFormat { .. } => {
                (StatusCode::NOT_IMPLEMENTED, "Unsupported output format")
            }
            DggforgeError::UnsupportedFeature { .. } => {
                (StatusCode::NOT_IMPLEMENTED, "Not implemented")
            }
            DggforgeError::TooManyCells { .. } => (StatusCode::FORBIDDEN, "Response too big"),
            DggforgeError::BackendUnavailable { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Backend unavailable")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Generation failed"),
        };

        Self {
            status,
            message: message.to_string(),
            details: Some(err.to_string()),
        }
    }
}
