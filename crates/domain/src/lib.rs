//! `storyengine-domain` — the pure game-state and scenario model.
//!
//! No I/O, no async: this crate is the part of the story engine that can be
//! unit-tested without a server, a storage backend, or an LLM. Everything
//! here is deterministic given its inputs.

extern crate self as storyengine_domain;

pub mod error;
pub mod fixtures;
pub mod game_state;
pub mod ids;
pub mod ordered_map;
pub mod scenario;

pub use error::GameError;
pub use game_state::{ChatMessage, GameState, Npc, Role, WorldLocation};
pub use ids::{GameId, ScenarioId};
pub use ordered_map::OrderedMap;
pub use scenario::{
    Conditional, CounterMatch, CounterOp, Scenario, ScenarioLocation, ScenarioNpc, Scene,
    StoryEvent, Then, When,
};
