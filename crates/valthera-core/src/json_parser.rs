//! JSON parsing utilities for oracle responses.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ValtheraError, ValtheraResult};
use crate::traits::{OracleVerdict, TriggerDraft};

static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid regex"));
static FENCED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[a-zA-Z0-9]*\n?([\s\S]*?)\n?```$").expect("valid regex"));
static THINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// Extract the JSON object from a possibly wrapped response.
///
/// Prefers a fenced code block; otherwise takes the span from the first `{`
/// to the last `}`.
pub fn extract_json(text: &str) -> ValtheraResult<String> {
    let text = text.trim();

    if let Some(content) = CODE_BLOCK_RE.captures(text).and_then(|c| c.get(1)) {
        return Ok(content.as_str().trim().to_string());
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(text[start..=end].to_string()),
        _ => Err(ValtheraError::oracle_parse(format!(
            "no JSON object in response: {}",
            truncate(text, 80)
        ))),
    }
}

/// Remove code fences and thinking tags from a response.
pub fn remove_code_blocks(content: &str) -> String {
    let content = content.trim();

    let content = FENCED_RE
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(content);

    THINK_RE.replace_all(content, "").trim().to_string()
}

/// Parse a reasoning oracle response.
///
/// The rationale (or its `analysis` alias) must be non-empty; the action is
/// kept as raw text for the reasoning engine to interpret.
pub fn parse_verdict(response: &str) -> ValtheraResult<OracleVerdict> {
    let json_str = extract_json(&remove_code_blocks(response))?;
    let verdict: OracleVerdict = serde_json::from_str(&json_str).map_err(|e| {
        ValtheraError::oracle_parse(format!("Failed to parse reasoning JSON: {}", e))
    })?;

    if verdict.rationale.trim().is_empty() {
        return Err(ValtheraError::oracle_missing_field("rationale"));
    }
    Ok(verdict)
}

/// Parse a generation oracle response into an unvalidated draft.
pub fn parse_trigger_draft(response: &str) -> ValtheraResult<TriggerDraft> {
    let json_str = extract_json(&remove_code_blocks(response))?;
    serde_json::from_str(&json_str).map_err(|e| {
        ValtheraError::oracle_parse(format!("Failed to parse trigger JSON: {}", e))
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
