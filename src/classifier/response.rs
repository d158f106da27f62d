//! Cleanup and structural parsing of raw classifier output
//!
//! The classifier is an LLM asked to answer with a minified JSON object, but
//! models routinely wrap their answer in markdown code fences or prefix it with
//! a language tag. Everything returned by the classifier passes through
//! [`parse_object`] before either caller looks at it.
//!
//! Parsing never fails with an error: it yields a [`ParseOutcome`] so that the
//! routing path can apply a silent default while persona extraction treats the
//! same outcome as a hard failure.

use serde_json::{Map, Value};

/// Maximum characters of raw output kept in a failure preview
pub const PREVIEW_CHARS: usize = 200;

/// Result of parsing classifier output as a JSON object
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Output parsed as a JSON object
    Parsed(Map<String, Value>),
    /// Output could not be parsed as a JSON object
    Failed {
        /// Why parsing failed (serde_json message or shape mismatch)
        reason: String,
        /// Truncated, UTF-8 safe preview of the cleaned output
        preview: String,
    },
}

impl ParseOutcome {
    /// Returns true if the output parsed as an object
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Strip surrounding markdown code fences and an optional language tag
///
/// Handles the shapes models actually produce:
/// - ```` ```json\n{...}\n``` ````
/// - ```` ```\n{...}\n``` ````
/// - ```` ```JSON {...}``` ```` (single line)
/// - ```` ```json {\n...\n}\n``` ```` (tag and object start share a line)
/// - an opening fence with no closing fence (truncated output)
///
/// Text that does not start with a fence is only trimmed. Content inside the
/// fence is never rewritten.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(after_fence) = text.strip_prefix("```") else {
        return text;
    };
    let after_fence = after_fence.trim_start_matches('`');

    let body = match after_fence.find('\n') {
        Some(newline) => {
            let opening_line = after_fence[..newline].trim();
            if opening_line.is_empty() || is_language_tag(opening_line) {
                &after_fence[newline + 1..]
            } else {
                strip_inline_tag(after_fence)
            }
        }
        None => strip_inline_tag(after_fence),
    };

    let body = body.trim_end();
    let body = match body.strip_suffix("```") {
        Some(rest) => rest.trim_end_matches('`'),
        None => body,
    };

    body.trim()
}

/// A language tag is a single short word like `json`, `JSON` or `json5`
fn is_language_tag(candidate: &str) -> bool {
    candidate.len() <= 16
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
}

/// Drop a tag glued to the payload on the opening line (```` ```json{...}``` ````)
fn strip_inline_tag(text: &str) -> &str {
    let tag_len = text
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(text.len());
    if tag_len == 0 {
        return text;
    }

    let rest = text[tag_len..].trim_start();
    if rest.starts_with('{') || rest.starts_with('[') {
        rest
    } else {
        text
    }
}

/// UTF-8 safe preview of `text`, truncated to `max_chars` characters
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Clean and parse raw classifier output as a single JSON object
pub fn parse_object(raw: &str) -> ParseOutcome {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => ParseOutcome::Parsed(map),
        Ok(other) => ParseOutcome::Failed {
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
            preview: preview(cleaned, PREVIEW_CHARS),
        },
        Err(e) => ParseOutcome::Failed {
            reason: e.to_string(),
            preview: preview(cleaned, PREVIEW_CHARS),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"route":"LOCAL_SMALL_MODEL","final_prompt":"Say hi"}"#;

    #[test]
    fn test_unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fences(&format!("  {}\n", PAYLOAD)), PAYLOAD);
    }

    #[test]
    fn test_strips_fence_with_json_tag() {
        let fenced = format!("```json\n{}\n```", PAYLOAD);
        assert_eq!(strip_code_fences(&fenced), PAYLOAD);
    }

    #[test]
    fn test_strips_fence_with_uppercase_tag() {
        let fenced = format!("```JSON\n{}\n```", PAYLOAD);
        assert_eq!(strip_code_fences(&fenced), PAYLOAD);
    }

    #[test]
    fn test_strips_fence_without_tag() {
        let fenced = format!("```\n{}\n```", PAYLOAD);
        assert_eq!(strip_code_fences(&fenced), PAYLOAD);
    }

    #[test]
    fn test_strips_single_line_fence_with_glued_tag() {
        let fenced = format!("```json{}```", PAYLOAD);
        assert_eq!(strip_code_fences(&fenced), PAYLOAD);

        let spaced = format!("```json {}```", PAYLOAD);
        assert_eq!(strip_code_fences(&spaced), PAYLOAD);
    }

    #[test]
    fn test_tag_sharing_line_with_multiline_object() {
        let pretty = "{\n  \"route\": \"CLOUD_LARGE_MODEL\",\n  \"final_prompt\": \"Go deep\"\n}";
        let fenced = format!("```json {}\n```", pretty);

        assert_eq!(strip_code_fences(&fenced), pretty);
        assert_eq!(parse_object(&fenced), parse_object(pretty));
        assert!(parse_object(&fenced).is_parsed());
    }

    #[test]
    fn test_object_on_opening_line_without_tag() {
        let pretty = "{\n  \"route\": \"LOCAL_SMALL_MODEL\"\n}";
        let fenced = format!("```{}\n```", pretty);
        assert_eq!(strip_code_fences(&fenced), pretty);
    }

    #[test]
    fn test_strips_unterminated_fence() {
        let fenced = format!("```json\n{}", PAYLOAD);
        assert_eq!(strip_code_fences(&fenced), PAYLOAD);
    }

    #[test]
    fn test_content_mentioning_json_is_preserved() {
        // The word "json" inside the payload must survive fence stripping
        let payload = r#"{"route":"LOCAL_SMALL_MODEL","final_prompt":"Explain json parsing"}"#;
        let fenced = format!("```json\n{}\n```", payload);
        assert_eq!(strip_code_fences(&fenced), payload);
    }

    #[test]
    fn test_fenced_output_parses_like_unfenced() {
        let plain = parse_object(PAYLOAD);
        let fenced = parse_object(&format!("```json\n{}\n```", PAYLOAD));
        assert!(plain.is_parsed());
        assert_eq!(plain, fenced);
    }

    #[test]
    fn test_non_json_text_fails() {
        match parse_object("not json at all") {
            ParseOutcome::Failed { preview, .. } => assert_eq!(preview, "not json at all"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_json_fails() {
        for raw in ["[1, 2]", "\"LOCAL_SMALL_MODEL\"", "42", "null", "true"] {
            match parse_object(raw) {
                ParseOutcome::Failed { reason, .. } => {
                    assert!(reason.contains("expected a JSON object"), "{}", reason)
                }
                other => panic!("{} should fail, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_empty_output_fails() {
        assert!(!parse_object("").is_parsed());
        assert!(!parse_object("```json\n```").is_parsed());
    }

    #[test]
    fn test_preview_truncates_on_char_boundaries() {
        let text = "é".repeat(300);
        let short = preview(&text, PREVIEW_CHARS);
        assert_eq!(short.chars().count(), PREVIEW_CHARS + 3);
        assert!(short.ends_with("..."));

        assert_eq!(preview("short", PREVIEW_CHARS), "short");
    }
}
