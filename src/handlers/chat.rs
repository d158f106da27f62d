//! Chat endpoint handler
//!
//! Handles POST /chat: route the message, then dispatch the decision's prompt
//! to the chosen backend.

use crate::error::AppResult;
use crate::handlers::{AppState, validate_text};
use crate::middleware::RequestId;
use crate::persona::PersonaProfile;
use crate::router::{Route, RoutingStrategy};
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

/// Maximum allowed message length in characters (100K chars)
const MAX_MESSAGE_LENGTH: usize = 100_000;

/// Chat request from client
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub profile: PersonaProfile,
}

/// Chat response to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Backend's answer
    pub content: String,
    /// Backend that served the request
    pub route: Route,
    /// Which path produced the routing decision
    pub strategy: RoutingStrategy,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    validate_text("message", &request.message, MAX_MESSAGE_LENGTH)?;

    tracing::debug!(
        request_id = %request_id,
        message_length = request.message.len(),
        "Received chat request"
    );

    let decision = state.router().decide(&request.profile, &request.message).await;
    let strategy = decision.strategy();
    let (route, final_prompt) = decision.into_parts();

    let content = state
        .backend()
        .complete(route, &final_prompt)
        .await
        .inspect_err(|e| {
            tracing::error!(
                request_id = %request_id,
                route = %route,
                error = %e,
                "Backend query failed"
            );
        })?;

    // Log-and-continue: observability never fails a request
    if let Err(e) = state.metrics().record_backend_invocation(route) {
        tracing::warn!(
            request_id = %request_id,
            error = %e,
            "Failed to record backend invocation metric"
        );
        state
            .metrics()
            .metrics_recording_failure("record_backend_invocation");
    }

    tracing::info!(
        request_id = %request_id,
        route = %route,
        strategy = strategy.as_str(),
        response_length = content.len(),
        "Chat request completed"
    );

    Ok(Json(ChatResponse {
        content,
        route,
        strategy,
    }))
}
