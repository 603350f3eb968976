//! Scenario — immutable authored content (spec §3, §4.B).
//!
//! A `Scenario` is loaded once and never mutated by the running game; the
//! engine only ever reads it. All ids inside a scenario (scene ids, location
//! ids, npc ids, variable names, story-event keys) are lowercase snake_case
//! by convention; enforcing and cross-reference-validating that pattern is
//! the job of the external scenario-JSON validator (out of scope here).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::ids::ScenarioId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub rating: String,
    pub default_pc: Option<String>,

    pub opening_scene: String,
    pub opening_location: String,
    pub opening_inventory: Vec<String>,
    pub opening_prompt: String,

    /// Scenario-wide narrator system prompt prefix (story/background).
    pub story_background: String,

    /// Scene id -> Scene. Insertion order matters for conditional
    /// "last match wins" semantics (spec §4.F, §9).
    pub scenes: IndexMap<String, Scene>,
    pub locations: IndexMap<String, ScenarioLocation>,
    pub npcs: IndexMap<String, ScenarioNpc>,

    /// Scenario-global contingency prompts, always active regardless of scene.
    pub contingency_prompts: Vec<String>,
    /// Scenario-global conditionals, evaluated alongside the active scene's.
    pub contingency_rules: Vec<Conditional>,

    /// Initial values for `GameState::vars`.
    pub vars: BTreeMap<String, String>,
}

impl Scenario {
    /// Structural check run at load time: every cross-reference a scenario
    /// makes (opening scene/location, per-scene location/npc subsets,
    /// conditional `then.scene`, story-event `when.location`) must resolve
    /// inside this same scenario.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.opening_prompt.trim().is_empty() {
            return Err(GameError::validation("opening_prompt must not be empty"));
        }
        self.scenes
            .get(&self.opening_scene)
            .ok_or_else(|| GameError::not_found("scene", self.opening_scene.clone()))?;
        if !self.opening_location.is_empty()
            && !self.locations.contains_key(&self.opening_location)
        {
            return Err(GameError::not_found(
                "location",
                self.opening_location.clone(),
            ));
        }

        for (scene_id, scene) in self.scenes.iter() {
            for loc in &scene.locations {
                if !self.locations.contains_key(loc) {
                    return Err(GameError::not_found(
                        "location",
                        format!("{loc} (referenced by scene {scene_id})"),
                    ));
                }
            }
            for npc in &scene.npcs {
                if !self.npcs.contains_key(npc) {
                    return Err(GameError::not_found(
                        "npc",
                        format!("{npc} (referenced by scene {scene_id})"),
                    ));
                }
            }
            for cond in scene.conditionals.iter().chain(self.contingency_rules.iter()) {
                if let Some(to) = &cond.then.scene_change {
                    if !self.scenes.contains_key(to) {
                        return Err(GameError::not_found("scene", to.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.get(scene_id)
    }
}

/// An authored location's static description. `GameState::world_locations`
/// copies this into the mutable world once a scene loads it (items/exits
/// may then diverge from the authored baseline as play progresses).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioLocation {
    pub description: String,
    #[serde(default)]
    pub exits: Vec<String>,
    #[serde(default)]
    pub blocked_exits: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioNpc {
    pub name: String,
    #[serde(default)]
    pub disposition: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub important: bool,
}

/// A subset of the scenario currently "active". Swaps on `scene_change`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Scene {
    #[serde(default)]
    pub instructions: String,
    pub locations: Vec<String>,
    pub npcs: Vec<String>,
    #[serde(default)]
    pub conditionals: Vec<Conditional>,
    /// Keyed by event id so triggered events can be tracked per-scene
    /// (spec §4.F phase 3: events don't repeat within a scene).
    #[serde(default)]
    pub story_events: IndexMap<String, StoryEvent>,
    #[serde(default)]
    pub contingency_rules: Vec<Conditional>,
    #[serde(default)]
    pub contingency_prompts: Vec<String>,
}

/// `{when, then}` rule evaluated after each turn (spec §4.F phase 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conditional {
    pub when: When,
    pub then: Then,
}

/// `{when, prompt}` whose prompt is injected into the *next* turn when
/// triggered (spec §4.F phase 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryEvent {
    pub when: When,
    pub prompt: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A predicate matched against the current `GameState`. Every specified
/// criterion must match for the clause to trigger (spec §4.F).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct When {
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    #[serde(default)]
    pub scene_turn_counter: Option<CounterMatch>,
    #[serde(default)]
    pub turn_counter: Option<CounterMatch>,
    #[serde(default)]
    pub min_scene_turns: Option<u64>,
    #[serde(default)]
    pub min_turns: Option<u64>,
    #[serde(default)]
    pub location: Option<String>,
}

impl When {
    /// A `When` with every field at its default matches everything; that's
    /// never a meaningful authored clause, so scenario loading should reject
    /// it (spec §6: "`when` must be non-empty").
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
            && self.scene_turn_counter.is_none()
            && self.turn_counter.is_none()
            && self.min_scene_turns.is_none()
            && self.min_turns.is_none()
            && self.location.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CounterMatch {
    pub op: CounterOp,
    pub value: u64,
}

impl CounterMatch {
    pub fn matches(&self, counter: u64) -> bool {
        match self.op {
            CounterOp::Eq => counter == self.value,
            CounterOp::Ge => counter >= self.value,
            CounterOp::Le => counter <= self.value,
            CounterOp::Gt => counter > self.value,
            CounterOp::Lt => counter < self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOp {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

/// The effects folded into the working delta when a `when` clause matches
/// (spec §4.F). At least one field must be set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Then {
    #[serde(default)]
    pub scene_change: Option<String>,
    #[serde(default)]
    pub game_ended: bool,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl Then {
    pub fn is_empty(&self) -> bool {
        self.scene_change.is_none() && !self.game_ended && self.prompt.is_none()
    }
}

/// Insertion-ordered map: scenes, conditionals and story events are
/// authored as ordered sequences (spec §9: "insertion-ordered mappings are
/// mandated ... so 'last match wins' is deterministic"). A plain `Vec` of
/// pairs with linear lookup is sufficient at scenario scale and keeps the
/// type simple to (de)serialize as a JSON object.
pub type IndexMap<K, V> = crate::ordered_map::OrderedMap<K, V>;

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_scenario() -> Scenario {
        let mut scenes = IndexMap::new();
        scenes.insert(
            "intro".to_string(),
            Scene {
                locations: vec!["tavern".to_string()],
                ..Default::default()
            },
        );
        let mut locations = IndexMap::new();
        locations.insert(
            "tavern".to_string(),
            ScenarioLocation {
                description: "A warm inn.".to_string(),
                exits: vec![],
                blocked_exits: vec![],
                items: vec![],
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
            opening_prompt: "You wake up.".to_string(),
            story_background: String::new(),
            scenes,
            locations,
            npcs: IndexMap::new(),
            contingency_prompts: vec![],
            contingency_rules: vec![],
            vars: BTreeMap::new(),
        }
    }

    #[test]
    fn validates_minimal_scenario() {
        assert!(minimal_scenario().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_opening_scene() {
        let mut s = minimal_scenario();
        s.opening_scene = "nowhere".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_empty_opening_prompt() {
        let mut s = minimal_scenario();
        s.opening_prompt = "   ".to_string();
        assert!(matches!(s.validate(), Err(GameError::Validation(_))));
    }

    #[test]
    fn counter_match_operators() {
        let m = CounterMatch {
            op: CounterOp::Ge,
            value: 3,
        };
        assert!(!m.matches(2));
        assert!(m.matches(3));
        assert!(m.matches(4));
    }
}
