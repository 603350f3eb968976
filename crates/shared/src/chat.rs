//! Wire-level request/response bodies for the `/v1` HTTP surface (spec §6).

use serde::{Deserialize, Serialize};
use storyengine_domain::{ChatMessage, GameId};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGameRequest {
    pub scenario: String,
    #[serde(default)]
    pub narrator_id: Option<String>,
    #[serde(default)]
    pub pc_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub gamestate_id: GameId,
    pub message: String,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub gamestate_id: GameId,
    pub message: String,
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: std::collections::BTreeMap<String, String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub service: String,
}
