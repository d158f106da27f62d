//! Error types for edgeroute
//!
//! All errors implement `IntoResponse` for Axum handlers.

use crate::persona::ExtractionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised while querying a model endpoint
///
/// Categorizes failures into systemic (misconfiguration, misbehaving model) and
/// transient (network, overloaded endpoint) so callers can decide whether a
/// retry is worthwhile.
#[derive(Debug, Error)]
pub enum ModelQueryError {
    /// Failed to build AgentOptions from endpoint configuration
    ///
    /// Systemic - retrying the same configuration cannot succeed.
    #[error("Failed to configure AgentOptions for {endpoint}: {details}")]
    AgentOptionsConfigError { endpoint: String, details: String },

    /// Stream failed to open or broke mid-response
    ///
    /// Transient - the endpoint may recover.
    #[error("Stream error from {endpoint} after {bytes_received} bytes received: {error_message}")]
    StreamError {
        endpoint: String,
        bytes_received: usize,
        error_message: String,
    },

    /// No response within the configured timeout
    ///
    /// Transient - the endpoint may be overloaded.
    #[error("Request to {endpoint} timed out after {timeout_seconds} seconds")]
    Timeout {
        endpoint: String,
        timeout_seconds: u64,
    },

    /// Response exceeded the configured size cap
    ///
    /// Systemic - indicates runaway generation.
    #[error("Response from {endpoint} exceeded {max_size} bytes (got {size} bytes)")]
    SizeExceeded {
        endpoint: String,
        size: usize,
        max_size: usize,
    },

    /// Stream completed without any text content
    #[error("Model at {endpoint} returned an empty response")]
    EmptyResponse { endpoint: String },
}

impl ModelQueryError {
    /// Returns true if this error is transient and a retry may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelQueryError::StreamError { .. } | ModelQueryError::Timeout { .. }
        )
    }

    /// Short, bounded label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentOptionsConfigError { .. } => "config",
            Self::StreamError { .. } => "stream",
            Self::Timeout { .. } => "timeout",
            Self::SizeExceeded { .. } => "size_exceeded",
            Self::EmptyResponse { .. } => "empty",
        }
    }
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    ModelQuery(#[from] ModelQueryError),

    #[error(transparent)]
    PersonaExtraction(#[from] ExtractionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ModelQuery(ModelQueryError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::ModelQuery(_) => StatusCode::BAD_GATEWAY,
            Self::PersonaExtraction(ExtractionError::Malformed(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::PersonaExtraction(ExtractionError::Classifier(_)) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
