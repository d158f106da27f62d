//! Rule-based routing strategy
//!
//! The hard length rule: requests with more words than the configured
//! threshold go straight to the cloud backend. Zero LLM overhead - a
//! decision here never touches the classifier.

use super::{Framing, PromptBuilder, Route, RoutingDecision, RoutingStrategy, word_count};
use crate::config::RoutingConfig;
use crate::persona::PersonaProfile;

/// Rule-based router applying the word-count threshold
#[derive(Debug, Clone)]
pub struct RuleBasedRouter {
    word_threshold: usize,
    prompts: PromptBuilder,
}

impl RuleBasedRouter {
    /// Create a rule-based router from an explicit threshold and prompt builder
    pub fn new(word_threshold: usize, prompts: PromptBuilder) -> Self {
        Self {
            word_threshold,
            prompts,
        }
    }

    /// Create a rule-based router from the `[routing]` section
    pub fn from_config(routing: &RoutingConfig) -> Self {
        Self::new(routing.word_threshold, PromptBuilder::from_config(routing))
    }

    /// Word threshold above which requests escalate
    pub fn word_threshold(&self) -> usize {
        self.word_threshold
    }

    /// Apply the hard rule
    ///
    /// Returns `Some(decision)` routed to [`Route::CloudLargeModel`] when the
    /// request has strictly more than `word_threshold` words, `None` otherwise.
    /// A request of exactly `word_threshold` words does not fire the rule.
    pub fn route(&self, profile: &PersonaProfile, request: &str) -> Option<RoutingDecision> {
        let words = word_count(request);
        if words <= self.word_threshold {
            return None;
        }

        tracing::debug!(
            word_count = words,
            word_threshold = self.word_threshold,
            "Request exceeds word threshold, escalating without classifier"
        );

        Some(RoutingDecision::new(
            Route::CloudLargeModel,
            self.prompts.build(profile, request, Framing::Cloud),
            RoutingStrategy::Rule,
        ))
    }
}

impl Default for RuleBasedRouter {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}
