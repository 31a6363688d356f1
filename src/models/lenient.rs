//! Field deserializers for records the model writes into replies. Those records
//! are loosely typed, so display fields take whatever scalar arrives.

use serde::{ Deserialize, Deserializer };
use serde_json::Value;

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Strings as-is, numbers and bools as their text, anything else as "".
pub fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where D: Deserializer<'de>
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Like [`loose_string`], but null and non-scalars become `None`.
pub fn loose_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where D: Deserializer<'de>
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}
