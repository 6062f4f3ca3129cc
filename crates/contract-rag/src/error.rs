//! Error types for the contract intelligence service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for contract-rag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Contract-rag errors
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown document id (or no persisted text for it)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Every text-extraction strategy failed
    #[error("Text extraction failed for '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Invalid configuration (e.g. chunking parameters)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding or vector index failure
    #[error("Indexing error: {0}")]
    Indexing(String),

    /// Filesystem failure
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// LLM capability failure or unparseable output
    #[error("LLM error: {0}")]
    Llm(String),

    /// Request data the service cannot accept
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an indexing error
    pub fn indexing(message: impl Into<String>) -> Self {
        Self::Indexing(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Extraction { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_error"),
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::Indexing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "indexing_error"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let resp = Error::not_found("doc").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = Error::Config("bad overlap".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = Error::extraction("a.pdf", "broken").into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_io_error_is_storage() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, Error::Storage(_)));
    }
}
