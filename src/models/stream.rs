use serde::{ Serialize, Deserialize };
use serde_json::Value;

/// One decoded increment of a streamed chat reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Content(String),
    Done,
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Content(_))
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ChatStreamRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
}

/// Payload of a single `data:` line.
#[derive(Deserialize, Debug, Default)]
pub struct StreamRecord {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub done: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl StreamRecord {
    /// Maps the record to an event; `None` when it carries nothing actionable.
    pub fn into_event(self) -> Option<StreamEvent> {
        if let Some(err) = self.error.filter(|e| !e.is_null()) {
            let message = match err {
                Value::String(s) => s,
                other => other.to_string(),
            };
            return Some(StreamEvent::Error(message));
        }
        if self.done.as_ref().map(truthy).unwrap_or(false) {
            return Some(StreamEvent::Done);
        }
        self.content.map(StreamEvent::Content)
    }
}
