#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Turns the model's free-form reply into a [`Judgment`].
//!
//! Two strategies run in order. The strict one extracts the outermost
//! `{...}` block and deserializes it; only when that fails does the
//! permissive one scrape `score:` / `feedback:` patterns from the raw text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{Judgment, Verdict};

/// Outermost brace-delimited block, spanning newlines.
static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON block regex"));

/// `score: 0.4` / `Score=0.4`.
static SCORE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)score\s*[:=]\s*([0-9]*\.?[0-9]+)").expect("valid score regex")
});

/// `feedback: rest of line`.
static FEEDBACK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)feedback\s*[:=]\s*(.+)").expect("valid feedback regex"));

/// Why the strict strategy rejected a reply.
#[derive(thiserror::Error, Debug)]
pub enum ReplyError {
    /// The extracted text is not JSON.
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The JSON is valid but is not an object.
    #[error("reply JSON is not an object")]
    NotAnObject,
    /// `score` is present but not a number or numeric string.
    #[error("reply score is not numeric: {0}")]
    NonNumericScore(Value),
}

/// Loose shape of the judgment object; every field is optional.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawJudgment {
    /// Number, numeric string or absent.
    score:       Option<Value>,
    /// Any JSON value, stringified when not a string.
    feedback:    Option<Value>,
    /// Any JSON value, stringified when not a string.
    mistake_tag: Option<Value>,
}

/// Renders a loosely typed field as trimmed text.
fn text_field(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Returns the outermost `{...}` block of `text`, if any.
pub fn extract_json_block(text: &str) -> Option<&str> {
    JSON_BLOCK.find(text).map(|m| m.as_str())
}

/// Strict strategy: deserializes the embedded JSON object, or the whole reply
/// when it contains no braces.
pub fn parse_strict(text: &str) -> Result<Judgment, ReplyError> {
    let block = extract_json_block(text).unwrap_or(text);
    let value: Value = serde_json::from_str(block)?;
    if !value.is_object() {
        return Err(ReplyError::NotAnObject);
    }
    let raw: RawJudgment = serde_json::from_value(value)?;

    let score = match raw.score {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ReplyError::NonNumericScore(Value::String(s.clone())))?,
        Some(other) => return Err(ReplyError::NonNumericScore(other)),
    };

    Ok(Judgment {
        score,
        feedback: text_field(raw.feedback),
        mistake_tag: text_field(raw.mistake_tag),
    })
}

/// Permissive strategy: scrapes a score and a feedback line. A missing score
/// is 0.0 and missing feedback is the whole reply.
pub fn parse_permissive(text: &str) -> Judgment {
    let score = SCORE_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    let feedback = FEEDBACK_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| text.trim().to_string());

    Judgment {
        score,
        feedback,
        mistake_tag: String::new(),
    }
}

/// Parses a reply, falling back to the permissive strategy when the strict
/// one fails.
pub fn parse_reply(text: &str) -> Verdict {
    match parse_strict(text) {
        Ok(judgment) => Verdict::Parsed(judgment),
        Err(err) => {
            tracing::debug!("Strict reply parse failed ({err}); scraping fields instead");
            Verdict::Fallback(parse_permissive(text))
        }
    }
}
