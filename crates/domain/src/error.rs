//! Unified error type for the domain layer.
//!
//! Keeps the game-state model free of `String`/`anyhow` at its boundary so
//! callers can match on failure kind instead of parsing messages.

use thiserror::Error;

/// Structural failures inside the pure game-state/scenario model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// A field failed validation (e.g. an empty opening prompt).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced id does not exist in the scope it was looked up in
    /// (e.g. a scene referencing a location the scenario never defines).
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// An invariant the model is supposed to uphold was about to be broken.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl GameError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_message() {
        let err = GameError::validation("opening_prompt must not be empty");
        assert_eq!(
            err.to_string(),
            "validation failed: opening_prompt must not be empty"
        );
    }

    #[test]
    fn not_found_error_message() {
        let err = GameError::not_found("scene", "outside");
        assert_eq!(err.to_string(), "scene not found: outside");
    }
}
