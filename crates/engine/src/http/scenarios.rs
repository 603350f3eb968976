//! `/v1/scenarios` — the read-only scenario catalog.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use storyengine_domain::{Scenario, ScenarioId};

use crate::error::EngineError;
use crate::state::AppState;

pub async fn list_scenarios(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Scenario>>, EngineError> {
    let scenarios = state.storage.list_scenarios().await?;
    Ok(Json(scenarios))
}

pub async fn get_scenario(
    State(state): State<Arc<AppState>>,
    Path(scenario_id): Path<ScenarioId>,
) -> Result<Json<Scenario>, EngineError> {
    let scenario = state
        .get_scenario(&scenario_id)
        .await
        .map_err(|_| EngineError::ScenarioNotFound(scenario_id.to_string()))?;
    Ok(Json(scenario))
}
