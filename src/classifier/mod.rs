//! Delegated classification calls
//!
//! The routing engine and the persona extractor both ask an auxiliary model a
//! question and get raw, untrusted text back. The [`Classifier`] trait is the
//! seam: production code uses [`OpenAgentClassifier`], tests inject stubs.

pub mod response;

pub use response::{ParseOutcome, parse_object, strip_code_fences};

use crate::config::{ClassifierConfig, Config, ModelEndpoint};
use crate::error::ModelQueryError;
use crate::models::query::{DEFAULT_RETRY_BACKOFF_MS, calculate_backoff, query_model};
use async_trait::async_trait;
use std::time::Duration;

/// Text-in/text-out classification call
///
/// Implementations make no promise about the shape of the returned text;
/// callers own all cleanup, parsing and validation.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Send one combined instruction + payload prompt, return the raw answer
    async fn invoke(&self, prompt: &str) -> Result<String, ClassifierError>;
}

/// Errors from the classification call itself (not from its content)
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Querying the classifier endpoint failed
    #[error("Classifier query failed after {attempts} attempt(s): {source}")]
    Query {
        attempts: usize,
        #[source]
        source: ModelQueryError,
    },

    /// No classifier could be reached
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

impl ClassifierError {
    /// Short, bounded label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Query { source, .. } => source.kind(),
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// Classifier backed by an OpenAI-compatible endpoint via `open-agent-sdk`
///
/// Enforces a per-attempt timeout and a response size cap, and retries
/// transient failures (timeouts, broken streams) with exponential backoff.
/// Systemic failures (empty or oversized output, bad configuration) are
/// returned immediately.
pub struct OpenAgentClassifier {
    endpoint: ModelEndpoint,
    settings: ClassifierConfig,
}

/// System message sent to the classifier when `[models.classifier]` sets none
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI that strictly follows instructions.";

impl OpenAgentClassifier {
    /// Create a classifier for `endpoint` with the given call limits
    pub fn new(endpoint: ModelEndpoint, settings: ClassifierConfig) -> Self {
        Self {
            endpoint: endpoint.with_default_system_prompt(DEFAULT_SYSTEM_PROMPT),
            settings,
        }
    }

    /// Create a classifier from `[models.classifier]` and `[classifier]`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.models.classifier.clone(), config.classifier.clone())
    }

    /// Get the endpoint this classifier queries
    pub fn endpoint(&self) -> &ModelEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for OpenAgentClassifier {
    async fn invoke(&self, prompt: &str) -> Result<String, ClassifierError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = query_model(
                &self.endpoint,
                prompt,
                self.settings.timeout_seconds,
                self.settings.max_response_bytes,
            )
            .await;

            match result {
                Ok(text) => {
                    tracing::debug!(
                        endpoint_name = %self.endpoint.name(),
                        response_length = text.len(),
                        attempt = attempt,
                        "Received classifier response"
                    );
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff_ms = calculate_backoff(DEFAULT_RETRY_BACKOFF_MS, attempt);
                    tracing::warn!(
                        endpoint_name = %self.endpoint.name(),
                        error = %e,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        backoff_ms = backoff_ms,
                        "Transient classifier failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(ClassifierError::Query {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}
