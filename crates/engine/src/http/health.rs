//! `/health` (spec §10.6 supplement): pings storage, reports whether an
//! LLM adapter is configured without making a live call to it — a 30s
//! LLM timeout has no business blocking a liveness probe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;

use crate::state::AppState;
use storyengine_shared::HealthResponse;

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let mut components = std::collections::BTreeMap::new();

    let storage_status = match state.storage.ping().await {
        Ok(()) => "ok",
        Err(_) => "unreachable",
    };
    components.insert("storage".to_string(), storage_status.to_string());

    let llm_status = if state.config.llm.api_key.is_empty() {
        "unconfigured"
    } else {
        "configured"
    };
    components.insert("llm".to_string(), llm_status.to_string());

    let ok = storage_status == "ok";
    let status_code = if ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    let body = Json(HealthResponse {
        status: if ok { "ok" } else { "degraded" }.to_string(),
        components,
        timestamp: Utc::now(),
        service: "storyengine".to_string(),
    });

    (status_code, body)
}
