//! `/v1/games` — create a game from a scenario, read back its state.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use storyengine_domain::{GameId, GameState, Scenario, ScenarioId};
use storyengine_shared::CreateGameRequest;

use crate::error::EngineError;
use crate::state::AppState;

pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameState>), EngineError> {
    let scenario_id = ScenarioId::from_str(&req.scenario)
        .map_err(|_| EngineError::InvalidRequest("scenario must be a valid id".to_string()))?;
    let scenario = state
        .get_scenario(&scenario_id)
        .await
        .map_err(|_| EngineError::ScenarioNotFound(req.scenario.clone()))?;

    let model_name = req
        .narrator_id
        .unwrap_or_else(|| state.config.llm.primary_model.clone());
    check_rating_compatibility(&scenario, &model_name, &state)?;

    let game = GameState::from_scenario_opening(GameId::new(), &scenario, model_name)?;
    state.storage.save_game(&game).await?;

    Ok((StatusCode::CREATED, Json(game)))
}

/// Rejects narrator/model combinations a scenario's rating disallows
/// (spec §6: "rejects rating-incompatible narrator/model combinations").
/// Ratings other than "mature"/"adult" place no restriction; those two
/// require the model to appear in `LLM_MATURE_MODELS`.
fn check_rating_compatibility(
    scenario: &Scenario,
    model_name: &str,
    state: &AppState,
) -> Result<(), EngineError> {
    let rating = scenario.rating.to_lowercase();
    if rating != "mature" && rating != "adult" {
        return Ok(());
    }
    if state
        .config
        .llm
        .mature_models
        .iter()
        .any(|m| m == model_name)
    {
        return Ok(());
    }
    Err(EngineError::InvalidRequest(format!(
        "model {model_name} is not approved for {rating} scenarios"
    )))
}

pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameState>, EngineError> {
    let game = state
        .storage
        .load_game(&game_id)
        .await
        .map_err(|_| EngineError::GameNotFound(game_id.to_string()))?;
    Ok(Json(game))
}

pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<GameId>,
) -> Result<(), EngineError> {
    state
        .storage
        .delete_game(&game_id)
        .await
        .map_err(|_| EngineError::GameNotFound(game_id.to_string()))?;
    Ok(())
}
