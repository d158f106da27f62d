//! HTTP request handlers for the edgeroute API

use crate::classifier::{Classifier, OpenAgentClassifier};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::models::{Backend, EndpointBackend};
use crate::persona::PersonaExtractor;
use crate::router::HybridRouter;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod health;
pub mod metrics;
pub mod persona;
pub mod route;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    router: Arc<HybridRouter>,
    extractor: Arc<PersonaExtractor>,
    backend: Arc<dyn Backend>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create state wired to the configured model endpoints
    ///
    /// Returns an error if metrics initialization fails.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let classifier: Arc<dyn Classifier> = Arc::new(OpenAgentClassifier::from_config(&config));
        let backend: Arc<dyn Backend> = Arc::new(EndpointBackend::from_config(&config));
        Self::with_components(config, classifier, backend)
    }

    /// Create state around an explicit classifier and backend
    pub fn with_components(
        config: Arc<Config>,
        classifier: Arc<dyn Classifier>,
        backend: Arc<dyn Backend>,
    ) -> AppResult<Self> {
        let metrics = Arc::new(Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to initialize metrics: {}", e))
        })?);

        let router = Arc::new(HybridRouter::new(
            &config.routing,
            classifier.clone(),
            metrics.clone(),
        ));
        let extractor = Arc::new(PersonaExtractor::new(classifier, metrics.clone()));

        Ok(Self {
            config,
            router,
            extractor,
            backend,
            metrics,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the hybrid router
    pub fn router(&self) -> &HybridRouter {
        &self.router
    }

    /// Get reference to the persona extractor
    pub fn extractor(&self) -> &PersonaExtractor {
        &self.extractor
    }

    /// Get reference to the backend dispatcher
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::handler))
        .route("/route", post(route::handler))
        .route("/persona", post(persona::handler))
        .route("/chat", post(chat::handler))
        .route("/metrics", get(metrics::handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject blank input and input over `max_chars` characters
pub(crate) fn validate_text(field: &str, value: &str, max_chars: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "{} cannot be empty or contain only whitespace",
            field
        )));
    }

    let char_count = value.chars().count();
    if char_count > max_chars {
        return Err(AppError::Validation(format!(
            "{} exceeds maximum length of {} characters (got {})",
            field, max_chars, char_count
        )));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared state builders for handler unit tests

    use super::*;
    use crate::classifier::testing::StubClassifier;
    use crate::router::Route;
    use async_trait::async_trait;

    pub(crate) const TEST_CONFIG: &str = r#"
[models.classifier]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 256

[models.local]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 1024

[models.cloud]
name = "llama3.1:8b"
base_url = "http://localhost:11434/v1"
max_tokens = 2048
"#;

    /// Backend echoing the route and prompt it was given
    pub(crate) struct EchoBackend;

    #[async_trait]
    impl Backend for EchoBackend {
        async fn complete(&self, route: Route, prompt: &str) -> AppResult<String> {
            Ok(format!("[{}] {}", route, prompt))
        }
    }

    pub(crate) fn state_with_reply(reply: &str) -> AppState {
        let config: Config = TEST_CONFIG.parse().expect("test config should parse");
        AppState::with_components(
            Arc::new(config),
            Arc::new(StubClassifier::replying(reply)),
            Arc::new(EchoBackend),
        )
        .expect("should create AppState")
    }

    pub(crate) fn offline_state() -> AppState {
        let config: Config = TEST_CONFIG.parse().expect("test config should parse");
        AppState::with_components(
            Arc::new(config),
            Arc::new(StubClassifier::unavailable()),
            Arc::new(EchoBackend),
        )
        .expect("should create AppState")
    }
}
