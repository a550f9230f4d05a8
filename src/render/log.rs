use super::StatusDisplay;
use crate::channel::SessionStatus;
use crate::event::DecodeError;
use tracing::{debug, info, warn};

/// [`StatusDisplay`] that writes everything to the tracing log
#[derive(Debug, Default)]
pub struct LogDisplay {
    chat_lines: u64,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chat lines shown so far
    pub fn chat_lines(&self) -> u64 {
        self.chat_lines
    }
}

impl StatusDisplay for LogDisplay {
    fn status(&mut self, channel: &str, status: &SessionStatus) {
        match status {
            SessionStatus::Connecting => info!(channel = %channel, "Connecting"),
            SessionStatus::Open => info!(channel = %channel, "Connected to {}", channel),
            SessionStatus::Closed => info!(channel = %channel, "Disconnected"),
            SessionStatus::Errored(reason) => {
                warn!(channel = %channel, error = %reason, "WebSocket error")
            }
        }
    }

    fn chat_line(&mut self, line: &str) {
        self.chat_lines += 1;
        info!(target: "geosync::chat", "{}", line);
    }

    fn decode_error(&mut self, error: &DecodeError) {
        match error {
            DecodeError::MalformedPayload { raw } => {
                warn!(raw = %raw, "Error, unable to parse WebSocket payload as JSON")
            }
            DecodeError::UnknownShape { pretty } => {
                warn!("Error, unknown JSON object on channel:\n{}", pretty)
            }
        }
    }

    fn payload(&mut self, pretty: &str) {
        debug!("Payload:\n{}", pretty);
    }
}
