use std::{collections::HashMap, fs};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub ollama_base_url: String,
    pub default_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            ollama_base_url: "http://localhost:11434".into(),
            default_model: "mistral".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("ollama_base_url") {
                settings.ollama_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("default_model") {
                settings.default_model = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Ok(v) = std::env::var("OLLAMA_BASE_URL") {
        settings.ollama_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__OLLAMA_BASE_URL") {
        settings.ollama_base_url = v;
    }

    if let Ok(v) = std::env::var("OLLAMA_DEFAULT_MODEL") {
        settings.default_model = v;
    }
    if let Ok(v) = std::env::var("APP__DEFAULT_MODEL") {
        settings.default_model = v;
    }

    settings.ollama_base_url = normalize_base_url(&settings.ollama_base_url);
    settings
}

/// Keeps `{base}/api/...` endpoint formatting stable regardless of how the
/// operator wrote the URL.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Settings::default().ollama_base_url;
    }
    trimmed.trim_end_matches('/').to_string()
}
