//! `storyengine-shared` — wire-level contracts shared by the engine and any
//! future client: the delta transport shape, `/v1` HTTP request/response
//! bodies, and the SSE event taxonomy.

pub mod chat;
pub mod delta;
pub mod events;

pub use chat::{ChatRequest, ChatResponse, CreateGameRequest, ErrorBody, HealthResponse};
pub use delta::{Container, ContainerRef, GameStateDelta, ItemAction, ItemEvent, NpcEvent};
pub use events::GameEvent;
