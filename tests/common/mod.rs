//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use edgeroute::classifier::{Classifier, ClassifierError};
use edgeroute::config::Config;
use edgeroute::error::AppResult;
use edgeroute::handlers::AppState;
use edgeroute::models::Backend;
use edgeroute::router::Route;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const MODELS_TOML: &str = r#"
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

pub fn test_config() -> Config {
    MODELS_TOML.parse().expect("test config should parse")
}

/// Classifier returning a fixed answer (or failing) and counting calls
pub struct ScriptedClassifier {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn invoke(&self, _prompt: &str) -> Result<String, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| ClassifierError::Unavailable("classifier offline".to_string()))
    }
}

/// Backend answering with the route it was asked to serve
pub struct EchoBackend;

#[async_trait]
impl Backend for EchoBackend {
    async fn complete(&self, route: Route, prompt: &str) -> AppResult<String> {
        Ok(format!("{} answered {} chars", route, prompt.len()))
    }
}

pub fn state_with(classifier: Arc<ScriptedClassifier>) -> AppState {
    AppState::with_components(Arc::new(test_config()), classifier, Arc::new(EchoBackend))
        .expect("should create AppState")
}
