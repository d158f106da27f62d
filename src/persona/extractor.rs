//! Persona profile extraction
//!
//! Turns a free-text self-description into a [`PersonaProfile`] through one
//! classifier call. The classifier output goes through the same cleanup and
//! parsing as routing output, but failures are surfaced instead of defaulted.

use super::{EXPERTISE_LEVELS, ExtractionError, MalformedProfileError, PersonaProfile};
use crate::classifier::response::{PREVIEW_CHARS, preview};
use crate::classifier::{Classifier, ParseOutcome, parse_object};
use crate::metrics::{ClassifierContext, Metrics};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Fixed extraction instruction sent ahead of the user's description
pub const EXTRACTION_PROMPT: &str = "\
You convert a user's self-description into a compact persona profile for an AI assistant.

Given the user's description, extract:

- persona_description: 1-2 sentences summarizing who they are.
- tone_preferences: how they like responses (e.g. 'detailed', 'concise', 'step-by-step', 'friendly').
- expertise_level: 'beginner', 'intermediate', or 'advanced' (for technical topics).
- preferred_language: language code, like 'en'.
- response_style: extra style preferences (e.g. 'use bullet points', 'include code examples').

Respond ONLY as a minified JSON object with exactly these keys.
No extra text, no explanations, no markdown.";

/// Extracts persona profiles via the classifier
pub struct PersonaExtractor {
    classifier: Arc<dyn Classifier>,
    metrics: Arc<Metrics>,
}

impl PersonaExtractor {
    pub fn new(classifier: Arc<dyn Classifier>, metrics: Arc<Metrics>) -> Self {
        Self {
            classifier,
            metrics,
        }
    }

    /// Extract a validated, repaired profile from `raw_description`
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::Classifier`] if the classification call failed
    /// - [`ExtractionError::Malformed`] if the output is not a JSON object,
    ///   has a field that cannot be coerced to text, or yields an all-empty
    ///   profile
    pub async fn extract(&self, raw_description: &str) -> Result<PersonaProfile, ExtractionError> {
        let result = self.extract_inner(raw_description).await;

        match &result {
            Ok(_) => self.metrics.persona_extraction("success"),
            Err(e) => {
                self.metrics.persona_extraction(e.kind());
                self.metrics
                    .classifier_failure(ClassifierContext::Persona, failure_kind(e));
            }
        }

        result
    }

    async fn extract_inner(&self, raw_description: &str) -> Result<PersonaProfile, ExtractionError> {
        let prompt = Self::build_extraction_prompt(raw_description);

        let raw = self.classifier.invoke(&prompt).await.map_err(|e| {
            tracing::warn!(error = %e, kind = e.kind(), "Persona extraction classifier call failed");
            ExtractionError::Classifier(e)
        })?;

        let data = match parse_object(&raw) {
            ParseOutcome::Parsed(data) => data,
            ParseOutcome::Failed { reason, preview } => {
                tracing::warn!(
                    reason = %reason,
                    response_preview = %preview,
                    "Persona extraction output is not a JSON object"
                );
                return Err(MalformedProfileError::new(reason, preview).into());
            }
        };

        let profile = repair(&data, &raw)?;
        tracing::debug!(
            expertise_level = %profile.expertise_level,
            preferred_language = %profile.preferred_language,
            "Extracted persona profile"
        );
        Ok(profile)
    }

    /// Build the classifier prompt: instruction, then the quoted description
    pub fn build_extraction_prompt(raw_description: &str) -> String {
        format!(
            "{}\n\nUSER_DESCRIPTION: \"\"\"{}\"\"\"",
            EXTRACTION_PROMPT, raw_description
        )
    }
}

fn failure_kind(error: &ExtractionError) -> &'static str {
    match error {
        ExtractionError::Malformed(_) => "malformed",
        ExtractionError::Classifier(e) => e.kind(),
    }
}

/// Coerce a parsed object into a profile
fn repair(data: &Map<String, Value>, raw: &str) -> Result<PersonaProfile, MalformedProfileError> {
    let mut profile = PersonaProfile::default();

    for (key, value) in data {
        let Some(slot) = profile.field_mut(key) else {
            tracing::debug!(key = %key, "Ignoring unknown persona field");
            continue;
        };
        *slot = coerce(value).ok_or_else(|| {
            MalformedProfileError::new(
                format!("field '{}' is not text-like", key),
                preview(raw, PREVIEW_CHARS),
            )
        })?;
    }

    profile.expertise_level = profile.expertise_level.to_lowercase();
    if !profile.expertise_level.is_empty()
        && !EXPERTISE_LEVELS.contains(&profile.expertise_level.as_str())
    {
        tracing::warn!(
            expertise_level = %profile.expertise_level,
            "Unrecognized expertise level, leaving it empty"
        );
        profile.expertise_level.clear();
    }
    profile.preferred_language = profile.preferred_language.to_lowercase();

    if profile.is_empty() {
        return Err(MalformedProfileError::new(
            "empty profile rejected by policy: parsed, but every persona field is empty",
            preview(raw, PREVIEW_CHARS),
        ));
    }

    Ok(profile)
}

/// Text form of a JSON value, or `None` for objects and nested arrays
fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| match item {
                    Value::Array(_) | Value::Object(_) => None,
                    scalar => coerce(scalar),
                })
                .collect::<Option<Vec<_>>>()?;
            Some(
                parts
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        }
        Value::Object(_) => None,
    }
}
