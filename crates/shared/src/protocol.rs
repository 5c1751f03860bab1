use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The add/update/delete/error instruction broadcast to UI listeners.
///
/// Parsed model output is forwarded verbatim, so this stays a transparent
/// wrapper over raw JSON rather than a closed struct: a syntactically valid
/// but semantically malformed command passes through unchanged and consumers
/// must tolerate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Command(Value);

impl Command {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A well-formed error command carrying an operator-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self(json!({
            "action": "error",
            "payload": { "message": message.into() },
        }))
    }

    pub fn action(&self) -> Option<&str> {
        self.0.get("action").and_then(Value::as_str)
    }

    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.0.get("payload").and_then(Value::as_object)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Command {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
