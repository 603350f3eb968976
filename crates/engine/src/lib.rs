//! `storyengine-engine` — the turn pipeline, LLM adapter, storage
//! backends, and HTTP/SSE surface built on top of `storyengine-domain`.

pub mod cancel;
pub mod commands;
pub mod config;
pub mod delta_worker;
pub mod error;
pub mod events;
pub mod http;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod state;
pub mod storage;

pub use config::AppConfig;
pub use error::EngineError;
pub use state::AppState;
