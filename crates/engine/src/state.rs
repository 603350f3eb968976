//! `AppState`: everything a request handler needs, composed once at
//! startup and cloned (cheaply, via `Arc`) into every axum handler.

use std::sync::Arc;

use dashmap::DashMap;
use storyengine_domain::{Scenario, ScenarioId};

use crate::cancel::CancelMap;
use crate::config::AppConfig;
use crate::events::EventBroadcaster;
use crate::llm::LlmAdapter;
use crate::storage::StoragePort;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StoragePort>,
    pub llm: Arc<dyn LlmAdapter>,
    pub events: Arc<EventBroadcaster>,
    pub cancel: Arc<CancelMap>,
    /// Read-through cache in front of `storage.get_scenario` (spec §10.6
    /// supplement): scenarios never change once authored, so there's no
    /// invalidation story to get wrong.
    scenario_cache: Arc<DashMap<ScenarioId, Scenario>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn StoragePort>,
        llm: Arc<dyn LlmAdapter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            llm,
            events: Arc::new(EventBroadcaster::new()),
            cancel: Arc::new(CancelMap::new()),
            scenario_cache: Arc::new(DashMap::new()),
        }
    }

    pub async fn get_scenario(
        &self,
        id: &ScenarioId,
    ) -> Result<Scenario, crate::storage::StorageError> {
        if let Some(cached) = self.scenario_cache.get(id) {
            return Ok(cached.clone());
        }
        let scenario = self.storage.get_scenario(id).await?;
        self.scenario_cache.insert(*id, scenario.clone());
        Ok(scenario)
    }
}
