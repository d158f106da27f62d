//! Persona profiles
//!
//! A persona profile is the structured preference data derived once from a
//! user's free-text self-description. The routing engine reads it to
//! personalize prompts and never modifies it.

pub mod extractor;
pub mod store;

pub use extractor::PersonaExtractor;
pub use store::{load_profile, save_profile};

use crate::classifier::ClassifierError;
use serde::{Deserialize, Serialize};

/// Accepted values for [`PersonaProfile::expertise_level`]
pub const EXPERTISE_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Structured user preferences
///
/// Every field is a plain string; a missing field deserializes as the empty
/// string, so `{}` is a valid (empty) profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaProfile {
    /// One or two sentences summarizing who the user is
    pub persona_description: String,
    /// How the user likes responses (e.g. "concise", "step-by-step")
    pub tone_preferences: String,
    /// One of [`EXPERTISE_LEVELS`], or empty when unknown
    pub expertise_level: String,
    /// Language code such as "en"
    pub preferred_language: String,
    /// Extra style preferences (e.g. "use bullet points")
    pub response_style: String,
}

impl PersonaProfile {
    /// Names of the five profile fields, in canonical order
    pub const FIELDS: [&'static str; 5] = [
        "persona_description",
        "tone_preferences",
        "expertise_level",
        "preferred_language",
        "response_style",
    ];

    /// Returns true when every field is empty
    pub fn is_empty(&self) -> bool {
        self.persona_description.is_empty()
            && self.tone_preferences.is_empty()
            && self.expertise_level.is_empty()
            && self.preferred_language.is_empty()
            && self.response_style.is_empty()
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "persona_description" => Some(&mut self.persona_description),
            "tone_preferences" => Some(&mut self.tone_preferences),
            "expertise_level" => Some(&mut self.expertise_level),
            "preferred_language" => Some(&mut self.preferred_language),
            "response_style" => Some(&mut self.response_style),
            _ => None,
        }
    }
}

/// Classifier output could not be coerced into a [`PersonaProfile`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed persona profile: {reason} (classifier output: {preview:?})")]
pub struct MalformedProfileError {
    reason: String,
    preview: String,
}

impl MalformedProfileError {
    /// Create a new error from a reason and a preview of the offending output
    pub fn new(reason: impl Into<String>, preview: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            preview: preview.into(),
        }
    }

    /// Why the output was rejected
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Truncated classifier output that was rejected
    pub fn preview(&self) -> &str {
        &self.preview
    }
}

/// Errors surfaced by persona extraction
///
/// Unlike routing, extraction never substitutes a synthetic default: a
/// fabricated persona would silently mis-personalize every later request.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The classifier answered, but not with a usable profile
    #[error(transparent)]
    Malformed(#[from] MalformedProfileError),

    /// The classification call itself failed
    #[error("Persona extraction failed: {0}")]
    Classifier(#[from] ClassifierError),
}

impl ExtractionError {
    /// Short, bounded label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::Classifier(_) => "classifier_error",
        }
    }
}
