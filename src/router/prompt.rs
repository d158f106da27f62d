//! Prompt builder
//!
//! Deterministically assembles the prompt sent to a backend from the persona
//! profile and the raw request. Used for hard-rule escalations, for every
//! routing fallback, and to repair classifier prompts that dropped the request.

use crate::config::RoutingConfig;
use crate::persona::PersonaProfile;

/// Which framing line opens the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Hard-rule escalation to the cloud backend
    Cloud,
    /// Fallback decisions
    Default,
}

/// Pure prompt assembly with configured framing lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    cloud_framing: String,
    default_framing: String,
}

impl PromptBuilder {
    /// Create a builder with explicit framing lines
    pub fn new(cloud_framing: impl Into<String>, default_framing: impl Into<String>) -> Self {
        Self {
            cloud_framing: cloud_framing.into(),
            default_framing: default_framing.into(),
        }
    }

    /// Create a builder from the `[routing]` section
    pub fn from_config(routing: &RoutingConfig) -> Self {
        Self::new(&routing.cloud_framing, &routing.default_framing)
    }

    /// Framing line used for `framing`
    pub fn framing_line(&self, framing: Framing) -> &str {
        match framing {
            Framing::Cloud => &self.cloud_framing,
            Framing::Default => &self.default_framing,
        }
    }

    /// Build the backend prompt
    ///
    /// The request is embedded verbatim as the last block, so the result
    /// always contains it.
    pub fn build(&self, profile: &PersonaProfile, request: &str, framing: Framing) -> String {
        format!(
            "{}\n\n\
             User persona: {}\n\
             Tone preferences: {}\n\
             Response style: {}\n\n\
             User request:\n\
             {}",
            self.framing_line(framing),
            profile.persona_description,
            profile.tone_preferences,
            profile.response_style,
            request
        )
    }

    /// Make sure a classifier-written prompt carries the request verbatim
    ///
    /// Returns `prompt` unchanged when it already contains `request`;
    /// otherwise appends the same `User request:` block `build` uses.
    pub fn ensure_request(&self, prompt: String, request: &str) -> String {
        if prompt.contains(request) {
            prompt
        } else {
            format!("{}\n\nUser request:\n{}", prompt.trim_end(), request)
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}
