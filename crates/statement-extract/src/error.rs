//! Error types for the extraction service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::types::response::ErrorBody;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Extraction service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed request (missing fields, wrong media type, oversize)
    #[error("{0}")]
    Validation(String),

    /// No `Authorization` header on the request
    #[error("No authentication token provided")]
    MissingCredentials,

    /// `Authorization` header present but the token does not match
    #[error("Invalid authentication token")]
    InvalidCredentials,

    /// Network or auth failure talking to the inference backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend reported that an uploaded file failed its own processing
    #[error("File {name} failed to process (state: {state})")]
    ProcessingFailed { name: String, state: String },

    /// A configured wait bound was exceeded
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The request was abandoned before the pipeline finished
    #[error("Extraction cancelled")]
    Cancelled,

    /// The converse call failed or returned unusable content
    #[error("Inference error: {0}")]
    Inference(String),

    /// Local or remote deletion failed. Logged, never returned to a caller.
    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an inference error
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable category used in the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::MissingCredentials | Error::InvalidCredentials => "auth_error",
            Error::Transport(_) => "transport_error",
            Error::ProcessingFailed { .. } => "processing_failed",
            Error::Timeout(_) => "timeout",
            Error::Cancelled => "cancelled",
            Error::Inference(_) => "inference_error",
            Error::Cleanup(_) => "cleanup_error",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::MissingCredentials => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller is at fault (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if self.is_client_error() {
            ErrorBody {
                error: self.to_string(),
                code: self.code().to_string(),
                details: None,
            }
        } else {
            ErrorBody {
                error: "Error processing file".to_string(),
                code: self.code().to_string(),
                details: Some(self.to_string()),
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::MissingCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::transport("x").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(Error::timeout("x").status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(Error::inference("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            Error::ProcessingFailed {
                name: "files/abc".into(),
                state: "FAILED".into()
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(Error::Cancelled.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_server_error_envelope_has_details() {
        let response = Error::inference("quota exceeded").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Error processing file");
        assert_eq!(body["code"], "inference_error");
        assert_eq!(body["details"], "Inference error: quota exceeded");
    }

    #[tokio::test]
    async fn test_client_error_envelope_omits_details() {
        let response = Error::validation("Only PDF files are allowed").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Only PDF files are allowed");
        assert_eq!(body["code"], "validation_error");
        assert!(body.get("details").is_none());
    }
}
