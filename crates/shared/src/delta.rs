//! `GameStateDelta` — the compact, typed description of one turn's mutations
//! (spec §3 "GameStateDelta", §4.F).
//!
//! This is a wire/transport shape: the delta-extraction LLM call is asked to
//! produce JSON matching this structure (or the adapter's tool-call
//! equivalent), and the delta worker in `storyengine-engine` applies it to a
//! `storyengine_domain::GameState`. Every field is optional because every
//! phase of delta application is total (spec §4.F: "missing optional fields
//! are no-ops").

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GameStateDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_change: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_events: Vec<ItemEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub npc_events: Vec<NpcEvent>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub game_ended: bool,
}

impl GameStateDelta {
    /// A delta with every field at its default: applying it is a no-op
    /// other than the turn-counter increment (spec §8 property 9).
    pub fn is_empty(&self) -> bool {
        self.user_location.is_none()
            && self.scene_change.is_none()
            && self.item_events.is_empty()
            && self.npc_events.is_empty()
            && self.set_vars.is_empty()
            && !self.game_ended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemAction {
    Acquire,
    Give,
    Drop,
    Move,
    Use,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    Player,
    Npc,
    Location,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemEvent {
    pub item: String,
    pub action: ItemAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ContainerRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ContainerRef>,
    /// Only meaningful for `action = use`: if false, the item is re-added
    /// to its source after being "used" (spec §4.F "Apply").
    #[serde(default = "default_consumed")]
    pub consumed: bool,
}

fn default_consumed() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerRef {
    pub kind: Container,
    /// Name of the npc or location; absent/ignored when `kind = player`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ContainerRef {
    pub fn player() -> Self {
        Self {
            kind: Container::Player,
            name: None,
        }
    }

    pub fn npc(name: impl Into<String>) -> Self {
        Self {
            kind: Container::Npc,
            name: Some(name.into()),
        }
    }

    pub fn location(name: impl Into<String>) -> Self {
        Self {
            kind: Container::Location,
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NpcEvent {
    pub npc_id: String,
    pub set_location: String,
}
