//! Hybrid router combining rule-based and LLM-based strategies
//!
//! Applies the hard length rule first (no classifier call), and delegates
//! everything else to the LLM-based router. This is the routing entry point
//! used by the HTTP service and the CLI.

use crate::classifier::Classifier;
use crate::config::RoutingConfig;
use crate::metrics::Metrics;
use crate::persona::PersonaProfile;
use crate::router::{LlmBasedRouter, RoutingDecision, RuleBasedRouter, word_count};
use std::sync::Arc;
use std::time::Instant;

/// Hybrid router combining rule-based and LLM-based strategies
pub struct HybridRouter {
    rule_router: RuleBasedRouter,
    llm_router: LlmBasedRouter,
    metrics: Arc<Metrics>,
}

impl HybridRouter {
    /// Create a new hybrid router
    pub fn new(
        routing: &RoutingConfig,
        classifier: Arc<dyn Classifier>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            rule_router: RuleBasedRouter::from_config(routing),
            llm_router: LlmBasedRouter::new(routing, classifier, metrics.clone()),
            metrics,
        }
    }

    /// Decide which backend serves `request` and build its prompt
    ///
    /// # Routing Logic
    /// 1. **Hard rule**: more words than the threshold goes to
    ///    `CLOUD_LARGE_MODEL` without consulting the classifier.
    /// 2. **Delegated classification**: everything else, with validation and
    ///    fallback to `LOCAL_SMALL_MODEL`.
    ///
    /// Never fails; the returned `final_prompt` is non-empty and contains
    /// `request` verbatim.
    pub async fn decide(&self, profile: &PersonaProfile, request: &str) -> RoutingDecision {
        let start = Instant::now();

        let decision = match self.rule_router.route(profile, request) {
            Some(decision) => decision,
            None => {
                tracing::debug!(
                    word_count = word_count(request),
                    "Hard rule did not fire, delegating to classifier"
                );
                self.llm_router.route(profile, request).await
            }
        };

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.record(&decision, duration_ms);

        tracing::info!(
            route = %decision.route(),
            strategy = decision.strategy().as_str(),
            word_count = word_count(request),
            final_prompt_length = decision.final_prompt().len(),
            duration_ms = duration_ms,
            "Route decision made"
        );

        decision
    }

    fn record(&self, decision: &RoutingDecision, duration_ms: f64) {
        if let Err(e) = self
            .metrics
            .record_decision(decision.route(), decision.strategy())
        {
            tracing::warn!(error = %e, "Failed to record routing decision metric");
            self.metrics.metrics_recording_failure("record_decision");
        }

        if let Err(e) = self
            .metrics
            .record_routing_duration(decision.strategy(), duration_ms)
        {
            tracing::warn!(
                error = %e,
                duration_ms = duration_ms,
                "Failed to record routing duration metric"
            );
            self.metrics.metrics_recording_failure("record_routing_duration");
        }
    }
}
