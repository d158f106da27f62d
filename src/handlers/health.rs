//! Health check endpoint
//!
//! Liveness only: the service is up if it can answer. Model endpoints are
//! not probed, because routing degrades to a local fallback on its own.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
}

/// Health check handler
pub async fn handler() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "OK" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let (status, Json(body)) = handler().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
    }
}
