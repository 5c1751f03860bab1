use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    domain::{InteractionEvent, UiComponent},
    error::GatewayError,
    protocol::Command,
};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub default_model: String,
    pub request_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Gateway to an Ollama-compatible inference backend.
///
/// Each request renders a deterministic instruction prompt, issues exactly
/// one non-streaming completion call, and recovers a single JSON command
/// from the free-text response. Every failure mode resolves to an `error`
/// command; nothing is raised past this boundary.
#[derive(Clone)]
pub struct OllamaClient {
    http: Client,
    config: OllamaConfig,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Base names from the backend catalog, sorted lexicographically. Falls
    /// back to the configured default model so a UI model picker never
    /// renders empty.
    pub async fn list_available_models(&self) -> Vec<String> {
        match self.fetch_models().await {
            Ok(models) => models,
            Err(error) => {
                warn!(%error, "model catalog unavailable, falling back to default");
                vec![self.config.default_model.clone()]
            }
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, GatewayError> {
        let url = format!("{}/api/tags", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| self.transport(&error))?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|error| GatewayError::Backend(error.to_string()))?;

        let mut names: Vec<String> = tags
            .models
            .into_iter()
            .map(|tag| base_model_name(&tag.name).to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Turns a natural-language request into a single UI mutation command.
    pub async fn request_ui_update(
        &self,
        prompt: &str,
        ui_state: &[UiComponent],
        model: &str,
    ) -> Command {
        let full_prompt = ui_update_prompt(prompt, &serialize_state(ui_state));
        self.generate_command(model, &full_prompt).await
    }

    /// Turns a user interaction with an existing component into a command.
    pub async fn request_ui_update_from_interaction(
        &self,
        interaction: &InteractionEvent,
        ui_state: &[UiComponent],
        model: &str,
    ) -> Command {
        let full_prompt = interaction_prompt(interaction, &serialize_state(ui_state));
        self.generate_command(model, &full_prompt).await
    }

    async fn generate_command(&self, model: &str, full_prompt: &str) -> Command {
        let model = self.effective_model(model);
        match self.generate(model, full_prompt).await {
            Ok(command) => command,
            Err(error) => Command::from(error),
        }
    }

    fn effective_model<'a>(&'a self, model: &'a str) -> &'a str {
        if model.trim().is_empty() {
            &self.config.default_model
        } else {
            model
        }
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Command, GatewayError> {
        let url = format!("{}/api/generate", self.config.base_url);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(&url)
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| self.transport(&error))?;
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|error| GatewayError::Backend(error.to_string()))?;

        debug!(raw = %body.response, "raw model response");
        Ok(Command::new(extract_json(&body.response)?))
    }

    fn transport(&self, error: &reqwest::Error) -> GatewayError {
        GatewayError::Transport {
            backend: self.config.base_url.clone(),
            reason: error.to_string(),
        }
    }
}

/// Best-effort recovery of a single JSON object embedded in free text. The
/// model is instructed to emit only JSON but commonly wraps it in prose, so
/// the candidate is everything between the first `{` and the last `}`.
fn extract_json(text: &str) -> Result<Value, GatewayError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(GatewayError::Extraction {
            raw: text.to_string(),
        });
    };

    let candidate = if start <= end { &text[start..=end] } else { "" };
    serde_json::from_str(candidate).map_err(|error| GatewayError::Parse {
        reason: error.to_string(),
        raw: text.to_string(),
    })
}

fn base_model_name(name: &str) -> &str {
    name.split(':').next().unwrap_or(name)
}

fn serialize_state(ui_state: &[UiComponent]) -> String {
    serde_json::to_string(ui_state).unwrap_or_else(|_| "[]".to_string())
}

fn ui_update_prompt(prompt: &str, state_json: &str) -> String {
    format!(
        r#"You are an expert AI assistant that generates UI modifications based on user requests.
Your goal is to translate natural language into a single, structured JSON command.
You will be given the user's prompt and the current state of the UI as a JSON array of components.
You MUST respond with ONLY a single JSON object describing the change. Do NOT add any explanatory text.

The JSON object must have two keys:
1. "action": A string that can be "add", "update", or "delete".
2. "payload": An object containing the data for the action.

ACTION DETAILS:
- "add": The payload must be a JSON object describing the new component.
  - It needs a "type" (e.g., "div", "input", "button", "select").
  - It needs a unique "id". Generate a short, descriptive ID based on its purpose.
  - It can have "props" like "text" for text elements, "placeholder" for inputs, or "options" for selects (as an array of strings).
  - Example: {{"action": "add", "payload": {{"type": "button", "id": "submit_btn", "props": {{"text": "Submit"}}}}}}

- "update": The payload must contain the "id" of the component to update and a "props" object with the new values.
  - Example: {{"action": "update", "payload": {{"id": "user_greeting", "props": {{"text": "Hello David!"}}}}}}

- "delete": The payload must contain the "id" of the component to remove.
  - Example: {{"action": "delete", "payload": {{"id": "old_button"}}}}

Analyze the user's request and the current UI state to determine the most logical action.
Your response must be ONLY the valid JSON object.

Current UI State: {state_json}

User Request: "{prompt}"

Assistant:
"#
    )
}

fn interaction_prompt(interaction: &InteractionEvent, state_json: &str) -> String {
    let values_json =
        serde_json::to_string(&interaction.values).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"You are an expert AI assistant that generates UI modifications in response to user interactions.
A user performed an action on a UI element. Your goal is to generate a single, structured JSON command to update the UI accordingly.
You will be given details of the interaction and the current state of the UI, including the values of all input fields.
You MUST respond with ONLY a single JSON object describing the change. Do NOT add any explanatory text.

The JSON object must have "action" and "payload" keys, following the same format as before.

INTERACTION DETAILS:
- Interacted Element ID: {element_id}
- Event Type: {event}
- Current values of all inputs: {values_json}

CURRENT UI STATE: {state_json}

Based on this user interaction and the current state, determine the appropriate UI change.
For example, if a user typed "apple" into an input with id "new_item_input" and clicked a button with id "add_btn", you might add "apple" to a dropdown list.

Assistant:
"#,
        element_id = interaction.id,
        event = interaction.event,
    )
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
