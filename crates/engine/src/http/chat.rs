//! `/v1/chat` — the chat turn endpoint (Component G's HTTP face).
//! `stream: true` is rejected with a clear error rather than silently
//! falling back; SSE narration lives at `/v1/games/:id/events` instead
//! (spec §4.K: events and chat replies are separate surfaces).

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use storyengine_shared::ChatRequest;
use storyengine_shared::ChatResponse;

use crate::error::EngineError;
use crate::orchestrator::run_turn;
use crate::state::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, EngineError> {
    if req.stream {
        return Err(EngineError::InvalidRequest(
            "use GET /v1/games/:id/events for streaming updates; POST /v1/chat is request/response only"
                .to_string(),
        ));
    }

    if req.message.trim().is_empty() {
        return Err(EngineError::InvalidRequest("message must not be empty".to_string()));
    }

    let reply = run_turn(state.clone(), req.gamestate_id, req.message).await?;
    let game = state
        .storage
        .load_game(&req.gamestate_id)
        .await
        .map_err(|_| EngineError::GameNotFound(req.gamestate_id.to_string()))?;

    Ok(Json(ChatResponse {
        gamestate_id: req.gamestate_id,
        message: reply,
        chat_history: game.chat_history,
    }))
}
