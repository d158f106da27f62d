//! Backend dispatch
//!
//! Sends a routing decision's `final_prompt` to the endpoint its route names.

use crate::config::{Config, ModelsConfig};
use crate::error::AppResult;
use crate::models::query::query_model;
use crate::router::Route;
use async_trait::async_trait;

/// Inference backend serving routed prompts
///
/// Allows dependency injection of the model call, so HTTP and CLI tests can
/// run without network access.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send `prompt` to the backend named by `route` and return its answer
    async fn complete(&self, route: Route, prompt: &str) -> AppResult<String>;
}

/// Backend querying `[models.local]` / `[models.cloud]` endpoints
pub struct EndpointBackend {
    models: ModelsConfig,
    timeout_seconds: u64,
    max_response_bytes: usize,
}

/// Upper bound on a backend answer
///
/// Backends write free-form answers, so the cap is far looser than the
/// classifier's.
pub const MAX_BACKEND_RESPONSE_BYTES: usize = 1024 * 1024;

impl EndpointBackend {
    pub fn new(models: ModelsConfig, timeout_seconds: u64) -> Self {
        Self {
            models,
            timeout_seconds,
            max_response_bytes: MAX_BACKEND_RESPONSE_BYTES,
        }
    }

    /// Backend using `[models]` and the server request timeout
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.models.clone(), config.server.request_timeout_seconds)
    }
}

#[async_trait]
impl Backend for EndpointBackend {
    async fn complete(&self, route: Route, prompt: &str) -> AppResult<String> {
        let endpoint = self.models.endpoint_for(route);

        tracing::debug!(
            route = %route,
            endpoint_name = %endpoint.name(),
            prompt_length = prompt.len(),
            "Dispatching prompt to backend"
        );

        let answer = query_model(
            endpoint,
            prompt,
            self.timeout_seconds,
            self.max_response_bytes,
        )
        .await?;

        Ok(answer)
    }
}
