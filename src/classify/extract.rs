use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"(?s)```json\n(.*?)\n```").unwrap();
    static ref TRAILING_COMMA_OBJECT: Regex = Regex::new(r",\s*\}").unwrap();
    static ref TRAILING_COMMA_ARRAY: Regex = Regex::new(r",\s*\]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

pub const JSON_FENCE: &str = "```json";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in message")]
    NoCandidate,
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an array field `{0}`")]
    MissingField(&'static str),
}

/// Slice from the first `open` to the last `close`, inclusive.
fn outermost(content: &str, open: char, close: char) -> Option<&str> {
    let start = content.find(open)?;
    let end = content.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}

/// The JSON text a listing message carries: the first fenced json block, else the
/// outermost braces.
pub fn object_candidate(content: &str) -> Option<&str> {
    let candidate = match FENCED_JSON.captures(content) {
        Some(caps) => caps.get(1).map(|m| m.as_str()),
        None => outermost(content, '{', '}'),
    }?;
    if candidate.is_empty() { None } else { Some(candidate) }
}

pub fn array_candidate(content: &str) -> Option<&str> {
    outermost(content, '[', ']')
}

/// Repairs the usual model output slips: trailing commas and ragged whitespace.
pub fn sanitize(candidate: &str) -> String {
    let cleaned = TRAILING_COMMA_OBJECT.replace_all(candidate, "}");
    let cleaned = TRAILING_COMMA_ARRAY.replace_all(&cleaned, "]");
    let cleaned = cleaned.replace('\n', " ");
    WHITESPACE_RUN.replace_all(&cleaned, " ").trim().to_string()
}

/// Pulls `{ "<field>": [...] }` out of a message and deserializes its entries.
pub fn listing<T: DeserializeOwned>(content: &str, field: &'static str) -> Result<Vec<T>, ExtractError> {
    let candidate = object_candidate(content).ok_or(ExtractError::NoCandidate)?;
    let value: Value = serde_json::from_str(&sanitize(candidate))?;
    let items = value
        .get(field)
        .and_then(Value::as_array)
        .ok_or(ExtractError::MissingField(field))?;
    items
        .iter()
        .map(|item| T::deserialize(item).map_err(ExtractError::from))
        .collect()
}

/// Text preceding the first json fence.
pub fn narrative(content: &str) -> &str {
    content.split(JSON_FENCE).next().unwrap_or(content)
}
