//! LLM-based router that delegates the routing judgment to a classifier model
//!
//! The classifier is asked to pick a route and to write the prompt for the
//! chosen backend. Its answer is untrusted: it is cleaned, parsed as a JSON
//! object and validated field by field. Every classifier fault (unreachable,
//! unparseable, invalid route, empty prompt) is absorbed into a valid
//! decision, so this router never returns an error.
//!
//! Fault handling, in order:
//!
//! | Classifier outcome                      | Route               | Prompt                     | Strategy   |
//! |-----------------------------------------|---------------------|----------------------------|------------|
//! | call failed                             | `LOCAL_SMALL_MODEL` | prompt builder (default)   | `Fallback` |
//! | not a JSON object                       | `LOCAL_SMALL_MODEL` | prompt builder (default)   | `Fallback` |
//! | `route` missing or not an exact token   | `LOCAL_SMALL_MODEL` | classifier's (if usable)   | `Llm`      |
//! | `final_prompt` missing, empty           | classifier's        | prompt builder (default)   | `Llm`      |
//! | `final_prompt` lacks the request        | classifier's        | classifier's + request     | `Llm`      |

use crate::classifier::{Classifier, ParseOutcome, parse_object};
use crate::config::RoutingConfig;
use crate::metrics::{ClassifierContext, Metrics};
use crate::persona::PersonaProfile;
use crate::router::{Framing, PromptBuilder, Route, RoutingDecision, RoutingStrategy};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Fixed instruction contract sent ahead of every routing payload
pub const ROUTER_SYSTEM_PROMPT: &str = "\
You are a router in a hybrid edge-cloud AI system.

You have access to TWO models:

1) LOCAL_SMALL_MODEL
   - A small model running on the user's machine.
   - Fast and cheap.
   - This should be the DEFAULT choice in most cases.

2) CLOUD_LARGE_MODEL
   - A larger hosted model.
   - Slower and more expensive.
   - Use this only when the extra capability clearly matters.

Your job:
1. Decide whether to use LOCAL_SMALL_MODEL or CLOUD_LARGE_MODEL.
2. Build a final_prompt string that we will send directly to the chosen model.

Routing principles (VERY IMPORTANT):

- Start from the assumption: \"LOCAL_SMALL_MODEL is enough\".
- Use LOCAL_SMALL_MODEL for:
  - Short or medium-length questions.
  - Everyday Q&A: definitions, explanations, basic reasoning, small examples.
  - Simple coding help or small code snippets.
  - Casual chat, jokes, preferences, simple planning.

- Escalate to CLOUD_LARGE_MODEL only when you see clear signals that a stronger model is needed, such as:
  - The user explicitly asks for a very detailed, exhaustive, or long answer.
  - The task requires deep, multi-step reasoning across many components (e.g. complex system design, long essays, multi-stage plans).
  - The user requests large code generation, complex refactoring, or analysis over a lot of text or code.
  - The request is very long and clearly not trivial to handle with a small model.

- When you are unsure or the request is borderline, prefer LOCAL_SMALL_MODEL.
  Your goal is to minimize CLOUD_LARGE_MODEL usage while still keeping answer quality good enough for the user.

The final_prompt you build should:
- Respect persona_description, tone_preferences, expertise_level, and response_style.
- Include clear instructions to the model about how to respond for this specific user.
- Include the user's request verbatim somewhere.

Respond ONLY as a minified JSON object with exactly these keys:
- route: \"LOCAL_SMALL_MODEL\" or \"CLOUD_LARGE_MODEL\"
- final_prompt: the full prompt string to send to that model

No explanations, no markdown, no extra keys.";

/// Separator between the contract and the JSON payload
const INPUT_MARKER: &str = "\n\nINPUT_JSON:\n";

/// Router that asks a classifier model for the route and the final prompt
pub struct LlmBasedRouter {
    classifier: Arc<dyn Classifier>,
    prompts: PromptBuilder,
    metrics: Arc<Metrics>,
}

impl LlmBasedRouter {
    /// Create a new LLM-based router
    ///
    /// The classifier is injected so tests (and alternative deployments) can
    /// swap the model call without touching routing policy.
    pub fn new(
        routing: &RoutingConfig,
        classifier: Arc<dyn Classifier>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            classifier,
            prompts: PromptBuilder::from_config(routing),
            metrics,
        }
    }

    /// Route a request by delegated classification
    ///
    /// Infallible: classifier faults produce a `LOCAL_SMALL_MODEL` decision
    /// with a prompt builder prompt. The returned `final_prompt` always
    /// contains `request`.
    pub async fn route(&self, profile: &PersonaProfile, request: &str) -> RoutingDecision {
        let router_prompt = Self::build_router_prompt(profile, request);

        let raw = match self.classifier.invoke(&router_prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = e.kind(),
                    "Routing classifier call failed, falling back to LOCAL_SMALL_MODEL"
                );
                self.metrics
                    .classifier_failure(ClassifierContext::Routing, e.kind());
                return self.fallback(profile, request);
            }
        };

        match parse_object(&raw) {
            ParseOutcome::Parsed(data) => self.interpret(&data, profile, request),
            ParseOutcome::Failed { reason, preview } => {
                tracing::warn!(
                    reason = %reason,
                    response_preview = %preview,
                    response_length = raw.len(),
                    "Routing classifier output is not a JSON object, falling back to LOCAL_SMALL_MODEL"
                );
                self.metrics
                    .classifier_failure(ClassifierContext::Routing, "unparseable");
                self.fallback(profile, request)
            }
        }
    }

    /// Build the classifier prompt: contract, marker, `{"traits", "request"}`
    ///
    /// The request is embedded whole; the JSON encoding escapes it, so request
    /// text cannot break out of the payload.
    pub fn build_router_prompt(profile: &PersonaProfile, request: &str) -> String {
        let payload = serde_json::json!({
            "traits": profile,
            "request": request,
        });
        format!("{}{}{}", ROUTER_SYSTEM_PROMPT, INPUT_MARKER, payload)
    }

    /// Validate a parsed classifier answer, repairing each field independently
    fn interpret(
        &self,
        data: &Map<String, Value>,
        profile: &PersonaProfile,
        request: &str,
    ) -> RoutingDecision {
        let route = match data.get("route") {
            Some(Value::String(token)) => match token.parse::<Route>() {
                Ok(route) => route,
                Err(e) => {
                    tracing::warn!(error = %e, "Classifier named an unknown route, using default");
                    self.metrics
                        .classifier_failure(ClassifierContext::Routing, "invalid_route");
                    Route::default()
                }
            },
            other => {
                tracing::warn!(
                    route_value = ?other,
                    "Classifier answer has no string 'route', using default"
                );
                self.metrics
                    .classifier_failure(ClassifierContext::Routing, "invalid_route");
                Route::default()
            }
        };

        let final_prompt = match data.get("final_prompt") {
            Some(Value::String(prompt)) if !prompt.trim().is_empty() => {
                let repaired = self.prompts.ensure_request(prompt.clone(), request);
                if repaired.len() != prompt.len() {
                    tracing::debug!("Classifier prompt omitted the request, appended it");
                    self.metrics
                        .classifier_failure(ClassifierContext::Routing, "prompt_repaired");
                }
                repaired
            }
            _ => {
                tracing::warn!("Classifier answer has no usable 'final_prompt', building default");
                self.metrics
                    .classifier_failure(ClassifierContext::Routing, "missing_prompt");
                self.prompts.build(profile, request, Framing::Default)
            }
        };

        RoutingDecision::new(route, final_prompt, RoutingStrategy::Llm)
    }

    fn fallback(&self, profile: &PersonaProfile, request: &str) -> RoutingDecision {
        RoutingDecision::new(
            Route::LocalSmallModel,
            self.prompts.build(profile, request, Framing::Default),
            RoutingStrategy::Fallback,
        )
    }
}
