//! Post-processing: turn raw generation text into something typed.
//!
//! The service returns free-form text. Two shapes are expected:
//!
//! - a single comma-separated line (header discovery), and
//! - a JSON array of objects (extraction and direct export), often wrapped in
//!   a ```` ```json ```` fence despite the prompt asking for raw JSON.
//!
//! Parsing yields a [`RawResponse`], which is either the array of row objects
//! or a [`MalformedResponse`] explaining what was wrong. Callers must handle
//! the malformed case before they touch any row.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// One JSON object per row, key order preserved.
pub type JsonRow = Map<String, Value>;

/// Outcome of parsing a JSON-array response.
pub type RawResponse = Result<Vec<JsonRow>, MalformedResponse>;

/// Why a response could not be used as a JSON array of objects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedResponse {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON array at the top level, found {0}")]
    NotAnArray(&'static str),

    #[error("element {index} of the array is {found}, expected an object")]
    NonObjectRow { index: usize, found: &'static str },
}

/// Parse the discovery response into ordered header labels.
///
/// Splits on commas, trims each label and drops empty ones. Order and
/// duplicates are kept as the model wrote them.
pub fn parse_header_line(text: &str) -> Vec<String> {
    remove_invisible_chars(text)
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an extraction or direct-export response.
pub fn parse_json_array(text: &str) -> RawResponse {
    let cleaned = remove_invisible_chars(text);
    let body = strip_code_fences(&cleaned);

    let value: Value =
        serde_json::from_str(body).map_err(|e| MalformedResponse::InvalidJson(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(MalformedResponse::NotAnArray(json_type(&value)));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(MalformedResponse::NonObjectRow {
                index,
                found: json_type(&other),
            }),
        })
        .collect()
}

// ── Code fences ──────────────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\r?\n?[ \t]*```$").unwrap());

/// Remove one pair of outer triple-backtick fences, with or without a
/// language tag. Unfenced text is returned trimmed.
pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str().trim()),
        None => trimmed,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
