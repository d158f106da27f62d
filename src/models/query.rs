//! Single-endpoint query execution
//!
//! Sends one prompt to one OpenAI-compatible endpoint through `open-agent-sdk`
//! and collects the streamed text. Used by both the classifier adapter and
//! the backend dispatcher.

use crate::config::ModelEndpoint;
use crate::error::ModelQueryError;
use std::time::Duration;

/// Default base backoff in milliseconds (doubles each retry)
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;
/// Maximum backoff duration in milliseconds
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Calculate exponential backoff with overflow protection
///
/// The formula is `base * 2^(attempt-1)`, capped at [`MAX_BACKOFF_MS`].
///
/// # Examples
/// With base=100ms:
/// - Attempt 1: 100ms
/// - Attempt 2: 200ms
/// - Attempt 3: 400ms
pub fn calculate_backoff(base_ms: u64, attempt: usize) -> u64 {
    let exponent = (attempt as u32).saturating_sub(1);
    base_ms
        .saturating_mul(2_u64.saturating_pow(exponent))
        .min(MAX_BACKOFF_MS)
}

/// Query a single endpoint with a prompt (no retry logic)
///
/// # Arguments
/// * `endpoint` - The model endpoint to query (its `system_prompt`, if any, is sent)
/// * `prompt` - The user-role prompt
/// * `timeout_seconds` - Maximum time to wait for the complete response
/// * `max_response_bytes` - Responses growing past this size are rejected mid-stream
///
/// # Errors
/// Returns a [`ModelQueryError`]; `is_retryable()` tells transient failures
/// (timeouts, broken streams) apart from systemic ones.
pub async fn query_model(
    endpoint: &ModelEndpoint,
    prompt: &str,
    timeout_seconds: u64,
    max_response_bytes: usize,
) -> Result<String, ModelQueryError> {
    let mut builder = open_agent::AgentOptions::builder()
        .model(endpoint.name())
        .base_url(endpoint.base_url())
        .max_tokens(endpoint.max_tokens() as u32)
        .temperature(endpoint.temperature() as f32);
    if let Some(system_prompt) = endpoint.system_prompt() {
        builder = builder.system_prompt(system_prompt);
    }

    let options = builder.build().map_err(|e| {
        tracing::error!(
            endpoint_name = %endpoint.name(),
            endpoint_url = %endpoint.base_url(),
            max_tokens = endpoint.max_tokens(),
            temperature = endpoint.temperature(),
            error = %e,
            "Failed to build AgentOptions from endpoint configuration"
        );
        ModelQueryError::AgentOptionsConfigError {
            endpoint: endpoint.base_url().to_string(),
            details: format!(
                "{}. Check configuration: model='{}', max_tokens={}, base_url='{}'",
                e,
                endpoint.name(),
                endpoint.max_tokens(),
                endpoint.base_url()
            ),
        }
    })?;

    tracing::debug!(
        endpoint_name = %endpoint.name(),
        prompt_length = prompt.len(),
        timeout_seconds = timeout_seconds,
        "Starting model query"
    );

    use futures::StreamExt;
    let timeout_result = tokio::time::timeout(Duration::from_secs(timeout_seconds), async {
        let mut stream = open_agent::query(prompt, &options).await.map_err(|e| {
            tracing::error!(
                endpoint_name = %endpoint.name(),
                endpoint_url = %endpoint.base_url(),
                error = %e,
                "Model query failed to connect or initialize stream"
            );
            ModelQueryError::StreamError {
                endpoint: endpoint.base_url().to_string(),
                bytes_received: 0,
                error_message: format!("{}", e),
            }
        })?;

        let mut response_text = String::new();
        while let Some(result) = stream.next().await {
            match result {
                Ok(block) => {
                    use open_agent::ContentBlock;
                    if let ContentBlock::Text(text_block) = block {
                        let size = response_text.len() + text_block.text.len();
                        if size > max_response_bytes {
                            tracing::error!(
                                endpoint_name = %endpoint.name(),
                                current_length = response_text.len(),
                                incoming_length = text_block.text.len(),
                                max_allowed = max_response_bytes,
                                "Model response exceeded size limit"
                            );
                            return Err(ModelQueryError::SizeExceeded {
                                endpoint: endpoint.base_url().to_string(),
                                size,
                                max_size: max_response_bytes,
                            });
                        }
                        response_text.push_str(&text_block.text);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        endpoint_name = %endpoint.name(),
                        endpoint_url = %endpoint.base_url(),
                        error = %e,
                        partial_response_length = response_text.len(),
                        "Stream error after {} bytes, discarding partial response",
                        response_text.len()
                    );
                    return Err(ModelQueryError::StreamError {
                        endpoint: endpoint.base_url().to_string(),
                        bytes_received: response_text.len(),
                        error_message: format!("{}", e),
                    });
                }
            }
        }

        Ok(response_text)
    })
    .await;

    let response_text = match timeout_result {
        Ok(result) => result?,
        Err(_elapsed) => {
            tracing::error!(
                endpoint_name = %endpoint.name(),
                endpoint_url = %endpoint.base_url(),
                timeout_seconds = timeout_seconds,
                prompt_length = prompt.len(),
                "Model query timed out"
            );
            return Err(ModelQueryError::Timeout {
                endpoint: endpoint.base_url().to_string(),
                timeout_seconds,
            });
        }
    };

    if response_text.trim().is_empty() {
        tracing::error!(
            endpoint_name = %endpoint.name(),
            endpoint_url = %endpoint.base_url(),
            "Model returned empty response (no text blocks received)"
        );
        return Err(ModelQueryError::EmptyResponse {
            endpoint: endpoint.base_url().to_string(),
        });
    }

    tracing::debug!(
        endpoint_name = %endpoint.name(),
        response_length = response_text.len(),
        "Model query completed"
    );

    Ok(response_text.trim().to_string())
}
