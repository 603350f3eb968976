//! In-memory storage backend: the primary test harness (spec §10.5) and
//! a reasonable default for single-node deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use storyengine_domain::{GameId, GameState, Scenario, ScenarioId};

use super::{StorageError, StoragePort};

#[derive(Default)]
pub struct InMemoryStorage {
    games: DashMap<GameId, GameState>,
    scenarios: DashMap<ScenarioId, Scenario>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the scenario catalog. Scenarios are read-only from the
    /// engine's point of view (spec §4.J); there is no `save_scenario`.
    pub fn with_scenario(self, scenario: Scenario) -> Self {
        self.scenarios.insert(scenario.id.clone(), scenario);
        self
    }
}

#[async_trait]
impl StoragePort for InMemoryStorage {
    async fn save_game(&self, state: &GameState) -> Result<(), StorageError> {
        self.games.insert(state.id.clone(), state.deep_copy());
        Ok(())
    }

    async fn load_game(&self, id: &GameId) -> Result<GameState, StorageError> {
        self.games
            .get(id)
            .map(|g| g.deep_copy())
            .ok_or_else(|| StorageError::NotFound(format!("game {id}")))
    }

    async fn delete_game(&self, id: &GameId) -> Result<(), StorageError> {
        self.games
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("game {id}")))
    }

    async fn list_scenarios(&self) -> Result<Vec<Scenario>, StorageError> {
        Ok(self.scenarios.iter().map(|e| e.value().clone()).collect())
    }

    async fn get_scenario(&self, id: &ScenarioId) -> Result<Scenario, StorageError> {
        self.scenarios
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| StorageError::NotFound(format!("scenario {id}")))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyengine_domain::fixtures::minimal_scenario;
    use storyengine_domain::GameState;

    #[tokio::test]
    async fn round_trips_a_saved_game() {
        let storage = InMemoryStorage::new();
        let scenario = minimal_scenario();
        let state = GameState::from_scenario_opening(
            GameId::new(),
            &scenario,
            "gpt-4o-mini".to_string(),
        )
        .unwrap();

        storage.save_game(&state).await.unwrap();
        let loaded = storage.load_game(&state.id).await.unwrap();
        assert_eq!(loaded.id, state.id);
        assert_eq!(loaded.scene_name, state.scene_name);
    }

    #[tokio::test]
    async fn load_missing_game_is_not_found() {
        let storage = InMemoryStorage::new();
        let err = storage.load_game(&GameId::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn scenario_catalog_is_seeded_and_readable() {
        let scenario = minimal_scenario();
        let id = scenario.id;
        let storage = InMemoryStorage::new().with_scenario(scenario);

        let listed = storage.list_scenarios().await.unwrap();
        assert_eq!(listed.len(), 1);
        let fetched = storage.get_scenario(&id).await.unwrap();
        assert_eq!(fetched.id, id);
    }
}
