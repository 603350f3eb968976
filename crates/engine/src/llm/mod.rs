//! LLM adapter interface (spec §4.E) and the tolerant JSON recovery routine
//! applied to free-text delta replies.

mod json_recovery;
mod openai_compat;

pub use json_recovery::recover_json;
pub use openai_compat::OpenAiCompatAdapter;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use storyengine_shared::GameStateDelta;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// One event in a [`LlmAdapter::chat_stream`] sequence (spec §4.E).
#[derive(Debug, Clone)]
pub enum StreamEvent {
    ContentDelta(String),
    Done,
    Error(String),
}

/// What `DeltaUpdate` got back from the model. Adapters that support
/// tool/function calling or structured outputs should prefer returning
/// `Structured`; otherwise `Text` is run through [`recover_json`] and
/// parsed by the caller (spec §4.E).
#[derive(Debug, Clone)]
pub enum DeltaOutcome {
    Structured(GameStateDelta),
    Text(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM request timed out")]
    Timeout,
    #[error("LLM returned an unparseable delta: {reason}")]
    UnparseableDelta {
        reason: String,
        original: String,
        cleaned: String,
    },
}

/// Two operations on any adapter: `chat` (narration) and `delta_update`
/// (structured extraction), both synchronous from the caller's point of
/// view. `chat_stream` is optional; implementations that don't support
/// token streaming return `Ok(false)` from `supports_streaming` and the
/// orchestrator falls back to `chat` (spec §4.E, §4.G step 7).
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn chat(&self, messages: &[LlmMessage], temperature: f32) -> Result<String, LlmError>;

    fn supports_streaming(&self) -> bool {
        false
    }

    async fn chat_stream(
        &self,
        messages: &[LlmMessage],
        temperature: f32,
    ) -> Result<BoxStream<'static, StreamEvent>, LlmError> {
        let _ = (messages, temperature);
        Err(LlmError::RequestFailed(
            "this adapter does not support streaming".to_string(),
        ))
    }

    /// Returns the extracted delta (or raw text to recover) plus the model
    /// id actually used for the call (spec §4.E).
    async fn delta_update(
        &self,
        messages: &[LlmMessage],
    ) -> Result<(DeltaOutcome, String), LlmError>;
}
