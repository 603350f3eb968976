//! HTTP/SSE surface (spec §6): route assembly, CORS and tracing layers.

mod chat;
mod games;
mod health;
mod scenarios;
mod sse;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = build_cors(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health::health))
        .route("/v1/games", post(games::create_game))
        .route(
            "/v1/games/{game_id}",
            get(games::get_game).delete(games::delete_game),
        )
        .route("/v1/games/{game_id}/events", get(sse::game_events))
        .route("/v1/chat", post(chat::chat))
        .route("/v1/scenarios", get(scenarios::list_scenarios))
        .route("/v1/scenarios/{scenario_id}", get(scenarios::get_scenario))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<axum::http::HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}
