//! A minimal, always-valid scenario used across this workspace's tests
//! (engine storage/orchestrator/http tests in particular need something
//! to seed a catalog with, not just this crate's own unit tests).

use std::collections::BTreeMap;

use crate::ids::ScenarioId;
use crate::ordered_map::OrderedMap;
use crate::scenario::{Scenario, ScenarioLocation, ScenarioNpc, Scene};

/// A single scene ("intro") with one location ("tavern") and one npc
/// ("bartender"), no conditionals or story events.
pub fn minimal_scenario() -> Scenario {
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
            exits: vec!["street".to_string()],
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
        name: "Test Scenario".to_string(),
        rating: "everyone".to_string(),
        default_pc: None,
        opening_scene: "intro".to_string(),
        opening_location: "tavern".to_string(),
        opening_inventory: vec![],
        opening_prompt: "You wake up in a tavern.".to_string(),
        story_background: "A sleepy trading town.".to_string(),
        scenes,
        locations,
        npcs,
        contingency_prompts: vec!["Stay in character.".to_string()],
        contingency_rules: vec![],
        vars: BTreeMap::new(),
    }
}
