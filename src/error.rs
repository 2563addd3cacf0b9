//! HTTP-facing error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors returned to API clients.
///
/// Provider failures never reach this type as-is: the OCR service folds them
/// into a failed [`crate::service::OcrResult`], and handlers lift that into
/// [`ApiError::Processing`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("File too large")]
    PayloadTooLarge { max: usize },

    #[error("Unsupported file type")]
    UnsupportedMediaType,

    #[error("{0}")]
    Processing(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Processing(msg) => tracing::error!("Processing failed: {}", msg),
            ApiError::PayloadTooLarge { max } => {
                tracing::warn!("Rejected upload larger than {} bytes", max)
            }
            _ => tracing::debug!("Rejected request: {}", self),
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge { max: 1 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::UnsupportedMediaType.status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError::Processing("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_processing_message_is_passed_through() {
        let err = ApiError::Processing("Mistral OCR API error (401): nope".into());
        assert_eq!(err.to_string(), "Mistral OCR API error (401): nope");
    }
}
