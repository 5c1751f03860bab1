use thiserror::Error;

use crate::protocol::Command;

/// Raw model text echoed into error commands is capped at this many bytes;
/// the echo exists for operator debugging, not machine consumption.
pub const RAW_ECHO_MAX_BYTES: usize = 2048;

/// Failure modes of the prompt-to-command pipeline. None of these escape the
/// gateway boundary as errors; each converts into an `error` command so the
/// broadcast channel and its listeners only ever see command values.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Could not connect to {backend}: {reason}")]
    Transport { backend: String, reason: String },
    #[error("No valid JSON object found in the model's response")]
    Extraction { raw: String },
    #[error("Invalid JSON from the model: {reason}")]
    Parse { reason: String, raw: String },
    #[error("Unexpected backend failure: {0}")]
    Backend(String),
}

impl From<GatewayError> for Command {
    fn from(error: GatewayError) -> Self {
        let message = match &error {
            GatewayError::Transport { .. } | GatewayError::Backend(_) => error.to_string(),
            GatewayError::Extraction { raw } | GatewayError::Parse { raw, .. } => {
                format!("{error}. Raw response: '{}'", truncate_echo(raw))
            }
        };
        Command::error(message)
    }
}

fn truncate_echo(raw: &str) -> &str {
    if raw.len() <= RAW_ECHO_MAX_BYTES {
        return raw;
    }
    let mut end = RAW_ECHO_MAX_BYTES;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}
