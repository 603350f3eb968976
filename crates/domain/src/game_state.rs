//! GameState — the complete mutable record of one player's playthrough
//! (spec §3, §4.A).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::ids::{GameId, ScenarioId};
use crate::scenario::Scenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub id: GameId,
    pub scenario_ref: ScenarioId,
    pub model_name: String,

    pub scene_name: String,
    pub location: String,
    pub world_locations: BTreeMap<String, WorldLocation>,
    pub npcs: BTreeMap<String, Npc>,
    pub inventory: Vec<String>,

    pub turn_counter: u64,
    pub scene_turn_counter: u64,

    pub vars: BTreeMap<String, String>,

    pub chat_history: Vec<ChatMessage>,
    pub contingency_prompts: Vec<String>,
    pub queued_story_events: Vec<String>,
    /// Event ids that have already triggered this scene (spec §4.F phase 3,
    /// §8 property 13). Cleared whenever `load_scene` runs.
    pub triggered_story_events: std::collections::BTreeSet<String>,

    pub is_ended: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldLocation {
    pub description: String,
    #[serde(default)]
    pub exits: Vec<String>,
    #[serde(default)]
    pub blocked_exits: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    #[serde(default)]
    pub disposition: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

impl GameState {
    /// Creates a fresh game state with empty history and zero counters.
    /// Callers apply the scenario's opening via [`GameState::load_scene`]
    /// and by seeding `location`/`inventory`/`vars` from the scenario.
    pub fn new(id: GameId, scenario_ref: ScenarioId, model_name: impl Into<String>) -> Self {
        Self {
            id,
            scenario_ref,
            model_name: model_name.into(),
            scene_name: String::new(),
            location: String::new(),
            world_locations: BTreeMap::new(),
            npcs: BTreeMap::new(),
            inventory: Vec::new(),
            turn_counter: 0,
            scene_turn_counter: 0,
            vars: BTreeMap::new(),
            chat_history: Vec::new(),
            contingency_prompts: Vec::new(),
            queued_story_events: Vec::new(),
            triggered_story_events: std::collections::BTreeSet::new(),
            is_ended: false,
            updated_at: Utc::now(),
        }
    }

    /// Initializes a brand-new game from a scenario's opening configuration.
    /// The opening prompt becomes `chat_history[0]` (an assistant message,
    /// per the invariant in spec §3).
    pub fn from_scenario_opening(
        id: GameId,
        scenario: &Scenario,
        model_name: impl Into<String>,
    ) -> Result<Self, GameError> {
        let mut state = Self::new(id, scenario.id, model_name);
        state.inventory = scenario.opening_inventory.clone();
        state.vars = scenario.vars.clone();
        state.load_scene(scenario, &scenario.opening_scene)?;
        state.location = scenario.opening_location.clone();
        state
            .chat_history
            .push(ChatMessage::assistant(scenario.opening_prompt.clone()));
        state.touch();
        Ok(state)
    }

    /// Replaces `scene_name`, merges the scene's locations/npcs into the
    /// mutable world, replaces `contingency_prompts` with scenario-global +
    /// scene-specific, and resets `scene_turn_counter` to 0 (spec §4.A).
    pub fn load_scene(&mut self, scenario: &Scenario, scene_id: &str) -> Result<(), GameError> {
        let scene = scenario
            .scene(scene_id)
            .ok_or_else(|| GameError::not_found("scene", scene_id))?;

        for loc_id in &scene.locations {
            if let Some(authored) = scenario.locations.get(loc_id) {
                self.world_locations
                    .entry(loc_id.clone())
                    .or_insert_with(|| WorldLocation {
                        description: authored.description.clone(),
                        exits: authored.exits.clone(),
                        blocked_exits: authored.blocked_exits.clone(),
                        items: authored.items.clone(),
                    });
            }
        }
        for npc_id in &scene.npcs {
            if let Some(authored) = scenario.npcs.get(npc_id) {
                self.npcs.entry(npc_id.clone()).or_insert_with(|| Npc {
                    name: authored.name.clone(),
                    disposition: authored.disposition.clone(),
                    description: authored.description.clone(),
                    location: authored.location.clone(),
                    important: authored.important,
                    items: Vec::new(),
                });
            }
        }

        let mut prompts = scenario.contingency_prompts.clone();
        prompts.extend(scene.contingency_prompts.clone());

        self.scene_name = scene_id.to_string();
        self.contingency_prompts = prompts;
        self.scene_turn_counter = 0;
        self.triggered_story_events.clear();
        self.touch();
        Ok(())
    }

    /// Both counters advance by one. Called once per applied delta when
    /// `is_ended` is false (spec §4.A, §4.F "Apply").
    pub fn increment_turn_counters(&mut self) {
        self.turn_counter += 1;
        self.scene_turn_counter += 1;
        self.touch();
    }

    /// Returns an independent clone for hand-off to background work
    /// (spec §3 "Ownership", §4.G step 9).
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Structural check used at creation time (spec §4.A).
    pub fn validate(&self) -> Result<(), GameError> {
        if !self.location.is_empty() && !self.world_locations.contains_key(&self.location) {
            return Err(GameError::invariant(format!(
                "location {} is not in world_locations",
                self.location
            )));
        }
        if self.turn_counter < self.scene_turn_counter {
            return Err(GameError::invariant(
                "turn_counter must be >= scene_turn_counter",
            ));
        }
        match self.chat_history.first() {
            Some(msg) if msg.role == Role::Assistant => {}
            Some(_) => {
                return Err(GameError::invariant(
                    "chat_history[0] must have role assistant",
                ))
            }
            None => return Err(GameError::invariant("chat_history must not be empty")),
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordered_map::OrderedMap;
    use crate::scenario::{Scenario, ScenarioLocation, ScenarioNpc, Scene};

    fn scenario() -> Scenario {
        let mut scenes = OrderedMap::new();
        scenes.insert(
            "intro".to_string(),
            Scene {
                locations: vec!["tavern".to_string()],
                npcs: vec!["bartender".to_string()],
                ..Default::default()
            },
        );
        let mut locations = OrderedMap::new();
        locations.insert(
            "tavern".to_string(),
            ScenarioLocation {
                description: "A warm inn.".to_string(),
                exits: vec![],
                blocked_exits: vec![],
                items: vec!["torch".to_string()],
            },
        );
        let mut npcs = OrderedMap::new();
        npcs.insert(
            "bartender".to_string(),
            ScenarioNpc {
                name: "Greta".to_string(),
                disposition: "neutral".to_string(),
                description: "Tired.".to_string(),
                location: "tavern".to_string(),
                important: true,
            },
        );
        Scenario {
            id: ScenarioId::new(),
            name: "Test".to_string(),
            rating: "everyone".to_string(),
            default_pc: None,
            opening_scene: "intro".to_string(),
            opening_location: "tavern".to_string(),
            opening_inventory: vec![],
            opening_prompt: "You wake up in a tavern.".to_string(),
            story_background: String::new(),
            scenes,
            locations,
            npcs,
            contingency_prompts: vec!["Stay in character.".to_string()],
            contingency_rules: vec![],
            vars: BTreeMap::new(),
        }
    }

    #[test]
    fn opening_produces_valid_state() {
        let scenario = scenario();
        let state =
            GameState::from_scenario_opening(GameId::new(), &scenario, "narrator-1").unwrap();
        assert!(state.validate().is_ok());
        assert_eq!(state.chat_history.len(), 1);
        assert_eq!(state.chat_history[0].role, Role::Assistant);
        assert_eq!(state.location, "tavern");
        assert_eq!(state.scene_name, "intro");
        assert!(state.world_locations.contains_key("tavern"));
        assert!(state.npcs.contains_key("bartender"));
        assert_eq!(state.contingency_prompts, vec!["Stay in character.".to_string()]);
    }

    #[test]
    fn increment_turn_counters_advances_both() {
        let scenario = scenario();
        let mut state =
            GameState::from_scenario_opening(GameId::new(), &scenario, "narrator-1").unwrap();
        state.increment_turn_counters();
        assert_eq!(state.turn_counter, 1);
        assert_eq!(state.scene_turn_counter, 1);
    }

    #[test]
    fn load_scene_resets_scene_turn_counter() {
        let scenario = scenario();
        let mut state =
            GameState::from_scenario_opening(GameId::new(), &scenario, "narrator-1").unwrap();
        state.increment_turn_counters();
        state.increment_turn_counters();
        assert_eq!(state.scene_turn_counter, 2);
        state.load_scene(&scenario, "intro").unwrap();
        assert_eq!(state.scene_turn_counter, 0);
        assert_eq!(state.turn_counter, 2);
    }

    #[test]
    fn deep_copy_is_independent() {
        let scenario = scenario();
        let state =
            GameState::from_scenario_opening(GameId::new(), &scenario, "narrator-1").unwrap();
        let mut copy = state.deep_copy();
        copy.increment_turn_counters();
        assert_eq!(state.turn_counter, 0);
        assert_eq!(copy.turn_counter, 1);
    }

    #[test]
    fn serde_round_trip_is_equal() {
        let scenario = scenario();
        let state =
            GameState::from_scenario_opening(GameId::new(), &scenario, "narrator-1").unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(state.id, back.id);
        assert_eq!(state.chat_history.len(), back.chat_history.len());
        assert_eq!(state.world_locations.len(), back.world_locations.len());
        assert_eq!(state.vars, back.vars);
    }

    #[test]
    fn validate_rejects_non_assistant_opening() {
        let scenario = scenario();
        let mut state =
            GameState::from_scenario_opening(GameId::new(), &scenario, "narrator-1").unwrap();
        state.chat_history[0].role = Role::User;
        assert!(state.validate().is_err());
    }
}
