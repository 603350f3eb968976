//! The event taxonomy published by the broadcaster and forwarded by the
//! SSE subscriber (spec §4.I, §4.K).
//!
//! Each variant's `#[serde(rename = ...)]` is the SSE `event:` field name an
//! HTTP client sees; the JSON payload becomes the `data:` field.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    #[serde(rename = "request.queued")]
    RequestQueued,

    #[serde(rename = "request.processing")]
    RequestProcessing,

    #[serde(rename = "request.completed")]
    RequestCompleted { message: String },

    #[serde(rename = "request.failed")]
    RequestFailed { error: String },

    #[serde(rename = "chat.chunk")]
    ChatChunk { content: String, done: bool },

    #[serde(rename = "game.state_updated")]
    GameStateUpdated { turn: u64, location: String },
}

impl GameEvent {
    /// The SSE `event:` field name, matching this variant's serde rename.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::RequestQueued => "request.queued",
            Self::RequestProcessing => "request.processing",
            Self::RequestCompleted { .. } => "request.completed",
            Self::RequestFailed { .. } => "request.failed",
            Self::ChatChunk { .. } => "chat.chunk",
            Self::GameStateUpdated { .. } => "game.state_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_matches_serde_tag() {
        let ev = GameEvent::GameStateUpdated {
            turn: 3,
            location: "cave".to_string(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "game.state_updated");
        assert_eq!(ev.event_name(), "game.state_updated");
    }
}
