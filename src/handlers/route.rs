//! Routing endpoint
//!
//! `POST /route` returns the routing decision without dispatching it. It
//! always answers 200 for a well-formed body, since routing never fails.

use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::persona::PersonaProfile;
use crate::router::RoutingDecision;
use axum::{Extension, Json, extract::State};
use serde::Deserialize;

/// Routing request from client
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    /// The user's request text (may be empty)
    pub request: String,
    /// Persona to personalize the prompt with; empty when omitted
    #[serde(default)]
    pub profile: PersonaProfile,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<RouteRequest>,
) -> Json<RoutingDecision> {
    tracing::debug!(
        request_id = %request_id,
        request_length = body.request.len(),
        "Received route request"
    );

    let decision = state.router().decide(&body.profile, &body.request).await;

    tracing::info!(
        request_id = %request_id,
        route = %decision.route(),
        strategy = decision.strategy().as_str(),
        "Route request answered"
    );

    Json(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{offline_state, state_with_reply};
    use crate::router::{Route, RoutingStrategy};

    fn body(request: &str) -> Json<RouteRequest> {
        Json(RouteRequest {
            request: request.to_string(),
            profile: PersonaProfile::default(),
        })
    }

    #[tokio::test]
    async fn test_route_handler_returns_classifier_decision() {
        let state = state_with_reply(
            r#"{"route":"CLOUD_LARGE_MODEL","final_prompt":"Deep dive: compare CRDTs and OT"}"#,
        );

        let Json(decision) = handler(
            State(state),
            Extension(RequestId::new()),
            body("compare CRDTs and OT"),
        )
        .await;

        assert_eq!(decision.route(), Route::CloudLargeModel);
        assert_eq!(decision.strategy(), RoutingStrategy::Llm);
    }

    #[tokio::test]
    async fn test_route_handler_falls_back_when_classifier_offline() {
        let Json(decision) = handler(
            State(offline_state()),
            Extension(RequestId::new()),
            body("hello"),
        )
        .await;

        assert_eq!(decision.route(), Route::LocalSmallModel);
        assert_eq!(decision.strategy(), RoutingStrategy::Fallback);
    }

    #[test]
    fn test_route_request_profile_is_optional() {
        let request: RouteRequest = serde_json::from_str(r#"{"request":"hi"}"#).unwrap();
        assert_eq!(request.profile, PersonaProfile::default());

        let request: RouteRequest = serde_json::from_str(
            r#"{"request":"hi","profile":{"tone_preferences":"concise"}}"#,
        )
        .unwrap();
        assert_eq!(request.profile.tone_preferences, "concise");
    }
}
