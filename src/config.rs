//! Configuration management for edgeroute
//!
//! Parses TOML configuration files and provides typed access to settings.

use crate::error::{AppError, AppResult};
use crate::router::Route;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Timeout for backend (local/cloud) model calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    60
}

/// The three model endpoints the system talks to
///
/// `classifier` answers routing and persona questions; `local` and `cloud`
/// are the two backends a [`Route`] can name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelsConfig {
    pub classifier: ModelEndpoint,
    pub local: ModelEndpoint,
    pub cloud: ModelEndpoint,
}

impl ModelsConfig {
    /// Backend endpoint serving the given route
    pub fn endpoint_for(&self, route: Route) -> &ModelEndpoint {
        match route {
            Route::LocalSmallModel => &self.local,
            Route::CloudLargeModel => &self.cloud,
        }
    }
}

/// Individual model endpoint configuration
///
/// Fields are private; instances come from deserialization and are checked by
/// `Config::validate()`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelEndpoint {
    name: String,
    base_url: String,
    max_tokens: usize,
    #[serde(default = "default_temperature")]
    temperature: f64,
    /// System message sent with every query to this endpoint
    #[serde(default)]
    system_prompt: Option<String>,
}

impl ModelEndpoint {
    /// Get the model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the endpoint base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the maximum number of tokens for this endpoint
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Get the temperature parameter for this endpoint
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Get the system prompt, if configured
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Use `prompt` as the system prompt unless one is already configured
    pub fn with_default_system_prompt(mut self, prompt: &str) -> Self {
        if self.system_prompt.is_none() {
            self.system_prompt = Some(prompt.to_string());
        }
        self
    }

    fn validate(&self, role: &str) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Config(format!(
                "Endpoint models.{} has an empty name",
                role
            )));
        }

        if self.max_tokens == 0 || self.max_tokens > u32::MAX as usize {
            return Err(AppError::Config(format!(
                "Endpoint '{}' (models.{}) has max_tokens={}. \
                max_tokens must be greater than 0 and fit in u32.",
                self.name, role, self.max_tokens
            )));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "Endpoint '{}' (models.{}) has invalid base_url '{}'. \
                base_url must start with 'http://' or 'https://'.",
                self.name, role, self.base_url
            )));
        }

        // OpenAI-compatible clients append /chat/completions to the base URL
        if !self.base_url.ends_with("/v1") {
            return Err(AppError::Config(format!(
                "Endpoint '{}' (models.{}) has invalid base_url '{}'. \
                base_url must end with '/v1' (e.g., 'http://localhost:11434/v1').",
                self.name, role, self.base_url
            )));
        }

        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "Endpoint '{}' (models.{}) has invalid temperature {}. \
                temperature must be a finite number between 0.0 and 2.0.",
                self.name, role, self.temperature
            )));
        }

        Ok(())
    }
}

fn default_temperature() -> f64 {
    0.7
}

/// Routing policy parameters
///
/// Defaults: a 500-word hard rule and the
/// two framing lines used by the prompt builder.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Requests with strictly more words than this go straight to the cloud
    #[serde(default = "default_word_threshold")]
    pub word_threshold: usize,
    /// First line of prompts built for the hard-rule cloud escalation
    #[serde(default = "default_cloud_framing")]
    pub cloud_framing: String,
    /// First line of prompts built for fallback decisions
    #[serde(default = "default_default_framing")]
    pub default_framing: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            word_threshold: default_word_threshold(),
            cloud_framing: default_cloud_framing(),
            default_framing: default_default_framing(),
        }
    }
}

fn default_word_threshold() -> usize {
    500
}

fn default_cloud_framing() -> String {
    "You are a powerful large language model.".to_string()
}

fn default_default_framing() -> String {
    "You are an AI assistant.".to_string()
}

/// Classifier call limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Attempts per classification call (transient failures only are retried)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_classifier_timeout(),
            max_response_bytes: default_max_response_bytes(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_classifier_timeout() -> u64 {
    30
}

fn default_max_response_bytes() -> usize {
    16 * 1024
}

fn default_max_attempts() -> usize {
    2
}

/// Upper bound on classifier attempts
pub const MAX_CLASSIFIER_ATTEMPTS: usize = 5;

/// Upper bound for any timeout setting, in seconds
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; call it explicitly when a
    /// `Config` is built any other way.
    pub fn validate(&self) -> AppResult<()> {
        for (role, endpoint) in [
            ("classifier", &self.models.classifier),
            ("local", &self.models.local),
            ("cloud", &self.models.cloud),
        ] {
            endpoint.validate(role)?;
        }

        if self.routing.word_threshold == 0 {
            return Err(AppError::Config(
                "routing.word_threshold must be greater than 0".to_string(),
            ));
        }
        if self.routing.cloud_framing.trim().is_empty() {
            return Err(AppError::Config(
                "routing.cloud_framing cannot be empty".to_string(),
            ));
        }
        if self.routing.default_framing.trim().is_empty() {
            return Err(AppError::Config(
                "routing.default_framing cannot be empty".to_string(),
            ));
        }

        if self.classifier.timeout_seconds == 0
            || self.classifier.timeout_seconds > MAX_TIMEOUT_SECONDS
        {
            return Err(AppError::Config(format!(
                "classifier.timeout_seconds must be in (0, {}], got {}",
                MAX_TIMEOUT_SECONDS, self.classifier.timeout_seconds
            )));
        }
        if self.classifier.max_response_bytes == 0 {
            return Err(AppError::Config(
                "classifier.max_response_bytes must be greater than 0".to_string(),
            ));
        }
        if self.classifier.max_attempts == 0
            || self.classifier.max_attempts > MAX_CLASSIFIER_ATTEMPTS
        {
            return Err(AppError::Config(format!(
                "classifier.max_attempts must be between 1 and {}, got {}",
                MAX_CLASSIFIER_ATTEMPTS, self.classifier.max_attempts
            )));
        }

        if self.server.request_timeout_seconds == 0
            || self.server.request_timeout_seconds > MAX_TIMEOUT_SECONDS
        {
            return Err(AppError::Config(format!(
                "server.request_timeout_seconds must be in (0, {}], got {}",
                MAX_TIMEOUT_SECONDS, self.server.request_timeout_seconds
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 3000
request_timeout_seconds = 45

[models.classifier]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 2048
temperature = 0.2
system_prompt = "You are a helpful AI that strictly follows instructions."

[models.local]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 4096
system_prompt = "You are a helpful local assistant."

[models.cloud]
name = "llama3.1:8b"
base_url = "http://192.168.1.50:11434/v1"
max_tokens = 8192
system_prompt = "You are a powerful AI assistant."

[routing]
word_threshold = 400
cloud_framing = "You are a frontier model."

[classifier]
timeout_seconds = 20
max_attempts = 3

[observability]
log_level = "debug"
"#;

    const MINIMAL_MODELS: &str = r#"
[models.classifier]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 2048

[models.local]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 4096

[models.cloud]
name = "llama3.1:8b"
base_url = "http://localhost:11434/v1"
max_tokens = 8192
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 45);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_config_parses_model_endpoints() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.models.classifier.name(), "gemma3:4b");
        assert_eq!(config.models.classifier.temperature(), 0.2);
        assert_eq!(config.models.local.temperature(), 0.7);
        assert_eq!(config.models.cloud.name(), "llama3.1:8b");
        assert_eq!(config.models.cloud.max_tokens(), 8192);
        assert_eq!(
            config.models.local.system_prompt(),
            Some("You are a helpful local assistant.")
        );
    }

    #[test]
    fn test_endpoint_for_route() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(
            config.models.endpoint_for(Route::LocalSmallModel).max_tokens(),
            4096
        );
        assert_eq!(
            config.models.endpoint_for(Route::CloudLargeModel).base_url(),
            "http://192.168.1.50:11434/v1"
        );
    }

    #[test]
    fn test_routing_overrides_and_partial_defaults() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.routing.word_threshold, 400);
        assert_eq!(config.routing.cloud_framing, "You are a frontier model.");
        assert_eq!(config.routing.default_framing, "You are an AI assistant.");
        assert_eq!(config.classifier.timeout_seconds, 20);
        assert_eq!(config.classifier.max_attempts, 3);
        assert_eq!(config.classifier.max_response_bytes, 16 * 1024);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_str(MINIMAL_MODELS).expect("should parse minimal config");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert_eq!(config.routing.word_threshold, 500);
        assert_eq!(
            config.routing.cloud_framing,
            "You are a powerful large language model."
        );
        assert_eq!(config.classifier.max_attempts, 2);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.models.classifier.system_prompt().is_none());
    }

    #[test]
    fn test_missing_models_section_fails_to_parse() {
        let result = Config::from_str("[server]\nport = 3000\n");
        assert!(matches!(result, Err(AppError::ConfigParseFailed { .. })));
    }

    fn with_extra(extra: &str) -> AppResult<Config> {
        Config::from_str(&format!("{}\n{}", MINIMAL_MODELS, extra))
    }

    #[test]
    fn test_config_validation_zero_word_threshold_fails() {
        let err = with_extra("[routing]\nword_threshold = 0").unwrap_err();
        assert!(err.to_string().contains("word_threshold"));
    }

    #[test]
    fn test_config_validation_empty_framing_fails() {
        let err = with_extra("[routing]\ncloud_framing = \"   \"").unwrap_err();
        assert!(err.to_string().contains("cloud_framing"));

        let err = with_extra("[routing]\ndefault_framing = \"\"").unwrap_err();
        assert!(err.to_string().contains("default_framing"));
    }

    #[test]
    fn test_config_validation_classifier_limits() {
        assert!(with_extra("[classifier]\ntimeout_seconds = 0").is_err());
        assert!(with_extra("[classifier]\ntimeout_seconds = 301").is_err());
        assert!(with_extra("[classifier]\ntimeout_seconds = 300").is_ok());
        assert!(with_extra("[classifier]\nmax_response_bytes = 0").is_err());
        assert!(with_extra("[classifier]\nmax_attempts = 0").is_err());
        assert!(with_extra("[classifier]\nmax_attempts = 6").is_err());
        assert!(with_extra("[classifier]\nmax_attempts = 5").is_ok());
    }

    #[test]
    fn test_config_validation_server_timeout() {
        assert!(with_extra("[server]\nrequest_timeout_seconds = 0").is_err());
        assert!(with_extra("[server]\nrequest_timeout_seconds = 500").is_err());
    }

    fn with_cloud_endpoint(endpoint: &str) -> AppResult<Config> {
        Config::from_str(&format!(
            r#"
[models.classifier]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 2048

[models.local]
name = "gemma3:4b"
base_url = "http://localhost:11434/v1"
max_tokens = 4096

[models.cloud]
{}
"#,
            endpoint
        ))
    }

    #[test]
    fn test_config_validation_invalid_base_url_fails() {
        let err = with_cloud_endpoint(
            "name = \"big\"\nbase_url = \"localhost:11434/v1\"\nmax_tokens = 10",
        )
        .unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_config_validation_base_url_must_end_with_v1() {
        let err = with_cloud_endpoint(
            "name = \"big\"\nbase_url = \"http://localhost:11434\"\nmax_tokens = 10",
        )
        .unwrap_err();
        assert!(err.to_string().contains("/v1"));
    }

    #[test]
    fn test_config_validation_zero_max_tokens_fails() {
        let err = with_cloud_endpoint(
            "name = \"big\"\nbase_url = \"http://localhost:11434/v1\"\nmax_tokens = 0",
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn test_config_validation_temperature_range() {
        let err = with_cloud_endpoint(
            "name = \"big\"\nbase_url = \"http://localhost:11434/v1\"\nmax_tokens = 10\ntemperature = 2.5",
        )
        .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_config_validation_empty_name_fails() {
        let err = with_cloud_endpoint(
            "name = \"\"\nbase_url = \"http://localhost:11434/v1\"\nmax_tokens = 10",
        )
        .unwrap_err();
        assert!(err.to_string().contains("models.cloud"));
    }
}
