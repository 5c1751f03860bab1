use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One element of the browser-side UI. The server never stores these; every
/// request carries the full current state as a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiComponent {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
}

/// Ordered snapshot of all current components, supplied fresh per request.
pub type UiState = Vec<UiComponent>;

/// A user action on an existing component, plus the live values of all
/// current input fields. Request-scoped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub id: String,
    pub event: String,
    #[serde(default)]
    pub values: Map<String, Value>,
}
