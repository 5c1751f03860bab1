use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use ollama_integration::{OllamaClient, OllamaConfig};
use serde::Deserialize;
use shared::{
    domain::{InteractionEvent, UiComponent},
    protocol::Command,
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info, warn};

mod bus;
mod config;

use bus::CommandBus;
use config::load_settings;

/// Idle window after which a comment frame is emitted to hold the SSE
/// connection open through proxies.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_millis(100);
const MAX_BODY_BYTES: usize = 1024 * 1024;

struct AppState {
    gateway: OllamaClient,
    bus: CommandBus,
}

#[derive(Debug, Deserialize)]
struct PromptRequest {
    prompt: String,
    #[serde(rename = "uiState")]
    ui_state: Vec<UiComponent>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct InteractionRequest {
    interaction: InteractionEvent,
    #[serde(rename = "uiState")]
    ui_state: Vec<UiComponent>,
    model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let gateway = OllamaClient::new(OllamaConfig {
        base_url: settings.ollama_base_url.clone(),
        default_model: settings.default_model.clone(),
        ..OllamaConfig::default()
    });
    let state = AppState {
        gateway,
        bus: CommandBus::new(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, backend = %settings.ollama_base_url, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/models", get(list_models))
        .route("/api/stream", get(stream))
        .route("/api/prompt", post(handle_prompt))
        .route("/api/interaction", post(handle_interaction))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.gateway.list_available_models().await)
}

async fn stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.bus.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(command) => match serde_json::to_string(&command) {
            Ok(data) => Some(Ok(Event::default().data(data))),
            Err(error) => {
                warn!(%error, "dropping unserializable command");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "listener lagged behind the broadcast channel");
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

async fn handle_prompt(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let request: PromptRequest = serde_json::from_value(body).map_err(invalid_request)?;

    let command = state
        .gateway
        .request_ui_update(&request.prompt, &request.ui_state, &request.model)
        .await;
    publish(&state, command);
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn handle_interaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let request: InteractionRequest = serde_json::from_value(body).map_err(invalid_request)?;

    let command = state
        .gateway
        .request_ui_update_from_interaction(&request.interaction, &request.ui_state, &request.model)
        .await;
    publish(&state, command);
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

fn publish(state: &AppState, command: Command) {
    debug!(command = %command.as_value(), "publishing command");
    state.bus.publish(command);
}

fn invalid_request(error: serde_json::Error) -> (StatusCode, Json<serde_json::Value>) {
    debug!(%error, "rejecting malformed request body");
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "Invalid request" })),
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
