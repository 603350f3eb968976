//! Storage interface (spec §4.J): persistence for game states plus
//! read-only access to the scenario catalog.

mod memory;

pub use memory::InMemoryStorage;

use async_trait::async_trait;
use storyengine_domain::{GameId, GameState, Scenario, ScenarioId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Single-writer-per-game discipline (spec §5) is enforced by the
/// orchestrator reloading and re-saving through this trait rather than
/// holding a shared mutable reference across await points; implementations
/// only need to guarantee that a single `save_game` is atomic.
#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn save_game(&self, state: &GameState) -> Result<(), StorageError>;
    async fn load_game(&self, id: &GameId) -> Result<GameState, StorageError>;
    async fn delete_game(&self, id: &GameId) -> Result<(), StorageError>;
    async fn list_scenarios(&self) -> Result<Vec<Scenario>, StorageError>;
    async fn get_scenario(&self, id: &ScenarioId) -> Result<Scenario, StorageError>;
    /// Cheap liveness probe for `/health` (spec §10.6 supplement); must
    /// not assume the backend is reachable before this is called.
    async fn ping(&self) -> Result<(), StorageError>;
}
