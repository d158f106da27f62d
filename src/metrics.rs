//! Prometheus metrics collection for edgeroute
//!
//! Tracks:
//! - Routing decisions by route and strategy
//! - Routing decision latency
//! - Classifier failures and normalizations, by calling context
//! - Persona extraction outcomes
//! - Backend invocations by route
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::router::{Route, RoutingStrategy};
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Which caller observed a classifier problem
///
/// Type-safe label so the two policies (absorb vs propagate) can be told
/// apart on dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierContext {
    /// Routing decision (faults absorbed into a fallback)
    Routing,
    /// Persona extraction (faults propagated)
    Persona,
}

impl ClassifierContext {
    /// Convert context to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Persona => "persona",
        }
    }
}

/// Metrics collector for edgeroute
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    decisions_total: CounterVec,
    routing_duration: HistogramVec,
    classifier_failures: IntCounterVec,
    persona_extractions: IntCounterVec,
    backend_invocations: IntCounterVec,
    metrics_recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 2 routes × 3 strategies = 6 time series
        let decisions_total = CounterVec::new(
            Opts::new(
                "edgeroute_decisions_total",
                "Total number of routing decisions by route and strategy",
            ),
            &["route", "strategy"],
        )?;

        let routing_duration = HistogramVec::new(
            HistogramOpts::new(
                "edgeroute_routing_duration_ms",
                "Routing decision latency in milliseconds",
            )
            .buckets(vec![
                0.1, 1.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0, 30000.0,
            ]),
            &["strategy"],
        )?;

        // Labels:
        // - context: routing | persona
        // - kind: query error kind, or a content problem (unparseable,
        //   invalid_route, missing_prompt, prompt_repaired, malformed)
        let classifier_failures = IntCounterVec::new(
            Opts::new(
                "edgeroute_classifier_failures_total",
                "Classifier call failures and output normalizations by calling context and kind",
            ),
            &["context", "kind"],
        )?;

        let persona_extractions = IntCounterVec::new(
            Opts::new(
                "edgeroute_persona_extractions_total",
                "Persona extraction attempts by outcome (success, malformed, classifier_error)",
            ),
            &["outcome"],
        )?;

        let backend_invocations = IntCounterVec::new(
            Opts::new(
                "edgeroute_backend_invocations_total",
                "Total backend model invocations by route",
            ),
            &["route"],
        )?;

        let metrics_recording_failures = IntCounterVec::new(
            Opts::new(
                "edgeroute_metrics_recording_failures_total",
                "Metrics recording operation failures by operation. \
                Indicates Prometheus internal errors.",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(decisions_total.clone()))?;
        registry.register(Box::new(routing_duration.clone()))?;
        registry.register(Box::new(classifier_failures.clone()))?;
        registry.register(Box::new(persona_extractions.clone()))?;
        registry.register(Box::new(backend_invocations.clone()))?;
        registry.register(Box::new(metrics_recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            decisions_total,
            routing_duration,
            classifier_failures,
            persona_extractions,
            backend_invocations,
            metrics_recording_failures,
        })
    }

    /// Record a routing decision
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered.
    pub fn record_decision(
        &self,
        route: Route,
        strategy: RoutingStrategy,
    ) -> Result<(), prometheus::Error> {
        self.decisions_total
            .get_metric_with_label_values(&[route.as_str(), strategy.as_str()])?
            .inc();
        Ok(())
    }

    /// Record routing decision duration
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite, or negative; such
    /// values would corrupt every percentile of the histogram.
    pub fn record_routing_duration(
        &self,
        strategy: RoutingStrategy,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite (not NaN or Infinity), got: {}",
                duration_ms
            )));
        }

        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative, got: {}",
                duration_ms
            )));
        }

        self.routing_duration
            .get_metric_with_label_values(&[strategy.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Record a backend invocation
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered.
    pub fn record_backend_invocation(&self, route: Route) -> Result<(), prometheus::Error> {
        self.backend_invocations
            .get_metric_with_label_values(&[route.as_str()])?
            .inc();
        Ok(())
    }

    /// Record a classifier failure or output normalization
    ///
    /// Infallible from the caller's perspective; label lookup failures are
    /// logged rather than propagated.
    pub fn classifier_failure(&self, context: ClassifierContext, kind: &str) {
        match self
            .classifier_failures
            .get_metric_with_label_values(&[context.as_str(), kind])
        {
            Ok(counter) => counter.inc(),
            Err(e) => {
                tracing::warn!(
                    context = context.as_str(),
                    kind = kind,
                    error = %e,
                    "Failed to record classifier failure metric"
                );
                self.metrics_recording_failure("classifier_failure");
            }
        }
    }

    /// Count of classifier failures for a context and kind
    pub fn classifier_failures_count(&self, context: ClassifierContext, kind: &str) -> u64 {
        self.classifier_failures
            .get_metric_with_label_values(&[context.as_str(), kind])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    /// Record a persona extraction outcome
    pub fn persona_extraction(&self, outcome: &str) {
        match self
            .persona_extractions
            .get_metric_with_label_values(&[outcome])
        {
            Ok(counter) => counter.inc(),
            Err(e) => {
                tracing::warn!(
                    outcome = outcome,
                    error = %e,
                    "Failed to record persona extraction metric"
                );
                self.metrics_recording_failure("persona_extraction");
            }
        }
    }

    /// Count of persona extractions with the given outcome
    pub fn persona_extractions_count(&self, outcome: &str) -> u64 {
        self.persona_extractions
            .get_metric_with_label_values(&[outcome])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    /// Record a metrics recording operation failure
    pub fn metrics_recording_failure(&self, operation: &str) {
        if let Ok(counter) = self
            .metrics_recording_failures
            .get_metric_with_label_values(&[operation])
        {
            counter.inc();
        }
    }

    /// Count of metrics recording failures for an operation
    pub fn metrics_recording_failures_count(&self, operation: &str) -> u64 {
        self.metrics_recording_failures
            .get_metric_with_label_values(&[operation])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    /// Gather all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or produces invalid UTF-8.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        tracing::debug!(
            metric_family_count = metric_families.len(),
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(error = %e, "Prometheus text encoder failed");
                prometheus::Error::Msg(format!(
                    "Failed to encode {} metric families: {}",
                    metric_families.len(),
                    e
                ))
            })?;

        String::from_utf8(buffer).map_err(|e| {
            tracing::error!(
                invalid_byte_index = e.utf8_error().valid_up_to(),
                "Prometheus encoder produced invalid UTF-8"
            );
            prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e))
        })
    }
}
