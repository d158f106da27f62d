//! Persona extraction endpoint
//!
//! `POST /persona` turns a free-text self-description into a profile.
//!
//! - `200 OK` with the profile
//! - `400 Bad Request` for an empty description
//! - `422 Unprocessable Entity` when the classifier output is not a usable profile
//! - `502 Bad Gateway` when the classifier could not be reached

use crate::error::AppResult;
use crate::handlers::{AppState, validate_text};
use crate::middleware::RequestId;
use crate::persona::PersonaProfile;
use axum::{Extension, Json, extract::State};
use serde::Deserialize;

/// Maximum accepted description length in characters
const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Persona extraction request from client
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaRequest {
    pub description: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<PersonaRequest>,
) -> AppResult<Json<PersonaProfile>> {
    validate_text("description", &body.description, MAX_DESCRIPTION_LENGTH)?;

    let profile = state
        .extractor()
        .extract(&body.description)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                kind = e.kind(),
                "Persona extraction failed"
            );
        })?;

    tracing::info!(
        request_id = %request_id,
        expertise_level = %profile.expertise_level,
        "Persona extracted"
    );

    Ok(Json(profile))
}
