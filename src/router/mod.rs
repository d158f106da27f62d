//! Routing logic for edgeroute
//!
//! Decides, per request, whether the cheap local backend or the costly cloud
//! backend serves it, and builds the exact prompt sent there.
//!
//! - [`RuleBasedRouter`]: deterministic word-count rule, no delegation
//! - [`LlmBasedRouter`]: delegated classification with validation and fallback
//! - [`HybridRouter`]: rule first, classifier otherwise; the public entry point

pub mod hybrid;
pub mod llm_based;
pub mod prompt;
pub mod rule_based;

pub use hybrid::HybridRouter;
pub use llm_based::LlmBasedRouter;
pub use prompt::{Framing, PromptBuilder};
pub use rule_based::RuleBasedRouter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend selection
///
/// A closed choice: every decision names exactly one of these, even when the
/// classifier returns garbage. Serialized as the wire tokens
/// `LOCAL_SMALL_MODEL` / `CLOUD_LARGE_MODEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    /// Cheap local endpoint; the default under uncertainty
    #[default]
    LocalSmallModel,
    /// Costly high-capacity endpoint
    CloudLargeModel,
}

impl Route {
    /// Wire token for this route
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalSmallModel => "LOCAL_SMALL_MODEL",
            Self::CloudLargeModel => "CLOUD_LARGE_MODEL",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token that is not one of the two route names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route token '{0}' (expected LOCAL_SMALL_MODEL or CLOUD_LARGE_MODEL)")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    /// Exact, case-sensitive token match
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "LOCAL_SMALL_MODEL" => Ok(Self::LocalSmallModel),
            "CLOUD_LARGE_MODEL" => Ok(Self::CloudLargeModel),
            other => Err(UnknownRoute(other.to_string())),
        }
    }
}

/// Which path produced a routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStrategy {
    /// Hard word-count rule fired
    Rule,
    /// Classifier output was accepted (after normalization)
    Llm,
    /// Classifier failed or answered unparseably; safe default applied
    Fallback,
}

impl RoutingStrategy {
    /// Convert to string representation for logging and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Llm => "llm",
            Self::Fallback => "fallback",
        }
    }
}

/// Result of a routing decision
///
/// `final_prompt` is sent verbatim to the backend named by `route`. It is
/// never empty and always contains the user's request text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    route: Route,
    final_prompt: String,
    strategy: RoutingStrategy,
}

impl RoutingDecision {
    pub(crate) fn new(route: Route, final_prompt: String, strategy: RoutingStrategy) -> Self {
        Self {
            route,
            final_prompt,
            strategy,
        }
    }

    /// Backend that should serve the request
    pub fn route(&self) -> Route {
        self.route
    }

    /// Prompt to send to the chosen backend
    pub fn final_prompt(&self) -> &str {
        &self.final_prompt
    }

    /// Path that produced this decision
    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    /// Split into `(route, final_prompt)`
    pub fn into_parts(self) -> (Route, String) {
        (self.route, self.final_prompt)
    }
}

/// Number of whitespace-delimited words in `text`
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
