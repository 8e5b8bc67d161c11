//! Pulls a JSON document out of free-form model output.
//!
//! Strategies run in order and the first hit wins: a ```json fence, any
//! ``` fence, the span from the first `{` to the last `}`, and finally the
//! trimmed input itself.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid regex"));
static FENCED_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\s*(.*?)\s*```").expect("valid regex"));
static BRACE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

#[derive(Debug, Error)]
#[error("model output is not valid JSON: {source}")]
pub struct ExtractError {
    #[source]
    pub source: serde_json::Error,
    pub raw: String,
}

pub type Strategy = fn(&str) -> Option<&str>;

/// Body of the first block fenced as ```json.
pub fn fenced_json(text: &str) -> Option<&str> {
    FENCED_JSON
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Body of the first ``` fenced block, whatever its label.
pub fn fenced_any(text: &str) -> Option<&str> {
    FENCED_ANY
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Greedy span from the first `{` to the last `}`. Not bracket-balanced.
pub fn brace_span(text: &str) -> Option<&str> {
    BRACE_SPAN.find(text).map(|m| m.as_str().trim())
}

pub const STRATEGIES: [Strategy; 3] = [fenced_json, fenced_any, brace_span];

/// Best-effort JSON substring of `text`.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(trimmed))
        .unwrap_or(trimmed)
}

/// Extracts and deserializes in one step, keeping the raw text on failure.
pub fn parse_embedded<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    serde_json::from_str(extract_json(text)).map_err(|source| ExtractError {
        source,
        raw: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn json_fence_round_trips() {
        let text = "평가 결과입니다.\n```json\n{\"grades\": {\"symptom_location\": \"상\"}}\n```\n감사합니다.";
        let parsed: Value = parse_embedded(text).unwrap();
        assert_eq!(parsed, json!({"grades": {"symptom_location": "상"}}));
    }

    #[test]
    fn json_fence_beats_bare_object() {
        let text = "draft {\"a\": 1}\n```json\n{\"b\": 2}\n```";
        assert_eq!(extract_json(text), "{\"b\": 2}");
    }

    #[test]
    fn unlabeled_fence_is_second_choice() {
        let text = "```\n{\"c\": 3}\n```";
        assert_eq!(fenced_json(text), None);
        assert_eq!(extract_json(text), "{\"c\": 3}");
    }

    #[test]
    fn brace_span_is_greedy() {
        let text = "prefix {\"a\": 1} middle {\"b\": 2} suffix";
        assert_eq!(brace_span(text), Some("{\"a\": 1} middle {\"b\": 2}"));
        assert!(parse_embedded::<Value>(text).is_err());
    }

    #[test]
    fn falls_back_to_trimmed_input() {
        assert_eq!(extract_json("  [1, 2]  "), "[1, 2]");
        assert_eq!(extract_json("no json here"), "no json here");
    }

    #[test]
    fn parse_error_keeps_raw_text() {
        let err = parse_embedded::<Value>("```json\n{broken\n```").unwrap_err();
        assert!(err.raw.contains("{broken"));
    }
}
