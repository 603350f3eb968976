//! Unified engine error, mapped to the HTTP error table in spec §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use storyengine_domain::GameError;
use storyengine_shared::ErrorBody;
use thiserror::Error;

use crate::llm::LlmError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("game not found: {0}")]
    GameNotFound(String),

    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::GameNotFound(_) => StatusCode::NOT_FOUND,
            Self::ScenarioNotFound(_) => StatusCode::BAD_REQUEST,
            Self::Game(_) => StatusCode::BAD_REQUEST,
            Self::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
