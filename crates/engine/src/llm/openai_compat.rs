//! Concrete LLM adapter for any OpenAI-chat-completions-compatible
//! endpoint. Grounded on the teacher's `infrastructure::llm` HTTP client
//! shape, generalized from a single vendor to "whatever base URL and
//! model the operator configures" (spec §4.E, §6 environment variables).

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::{recover_json, DeltaOutcome, LlmAdapter, LlmError, LlmMessage, LlmRole, StreamEvent};

pub struct OpenAiCompatAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    primary_model: String,
    backend_model: String,
}

impl OpenAiCompatAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        primary_model: impl Into<String>,
        backend_model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let primary_model = primary_model.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            backend_model: backend_model.unwrap_or_else(|| primary_model.clone()),
            primary_model,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn wire_messages(messages: &[LlmMessage]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    LlmRole::System => "system",
                    LlmRole::User => "user",
                    LlmRole::Assistant => "assistant",
                },
                content: m.content.clone(),
            })
            .collect()
    }
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: ToolCallFunction,
}

#[derive(Deserialize)]
struct ToolCallFunction {
    arguments: String,
}

#[derive(Deserialize)]
struct StreamChunkWire {
    choices: Vec<StreamChoiceWire>,
}

#[derive(Deserialize)]
struct StreamChoiceWire {
    delta: StreamDeltaWire,
}

#[derive(Deserialize, Default)]
struct StreamDeltaWire {
    content: Option<String>,
}

const DELTA_TOOL_NAME: &str = "apply_game_state_delta";

fn delta_tool_schema() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": DELTA_TOOL_NAME,
            "description": "Record the state changes implied by the last narration turn.",
            "parameters": {
                "type": "object",
                "properties": {
                    "vars": {"type": "object"},
                    "user_location": {"type": "string"},
                    "item_events": {"type": "array"},
                    "npc_events": {"type": "array"},
                    "game_ended": {"type": "boolean"}
                }
            }
        }
    })
}

#[async_trait]
impl LlmAdapter for OpenAiCompatAdapter {
    async fn chat(&self, messages: &[LlmMessage], temperature: f32) -> Result<String, LlmError> {
        let body = json!({
            "model": self.primary_model,
            "messages": Self::wire_messages(messages),
            "temperature": temperature,
            "stream": false,
        });

        let resp = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let completion: ChatCompletion = resp.json().await.map_err(map_reqwest_err)?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::RequestFailed("no choices in chat completion".to_string()))
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn chat_stream(
        &self,
        messages: &[LlmMessage],
        temperature: f32,
    ) -> Result<BoxStream<'static, StreamEvent>, LlmError> {
        let body = json!({
            "model": self.primary_model,
            "messages": Self::wire_messages(messages),
            "temperature": temperature,
            "stream": true,
        });

        let resp = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let byte_stream = resp.bytes_stream();
        let events = byte_stream.flat_map(|chunk| {
            let events: Vec<StreamEvent> = match chunk {
                Ok(bytes) => parse_sse_chunk(&bytes),
                Err(e) => vec![StreamEvent::Error(e.to_string())],
            };
            futures_util::stream::iter(events)
        });

        Ok(Box::pin(events))
    }

    async fn delta_update(
        &self,
        messages: &[LlmMessage],
    ) -> Result<(DeltaOutcome, String), LlmError> {
        let body = json!({
            "model": self.backend_model,
            "messages": Self::wire_messages(messages),
            "temperature": 0.0,
            "stream": false,
            "tools": [delta_tool_schema()],
            "tool_choice": {"type": "function", "function": {"name": DELTA_TOOL_NAME}},
        });

        let resp = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let completion: ChatCompletion = resp.json().await.map_err(map_reqwest_err)?;
        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::RequestFailed("no choices in delta completion".to_string()))?;

        if let Some(call) = message.tool_calls.into_iter().next() {
            let delta = serde_json::from_str(&call.function.arguments).map_err(|e| {
                LlmError::UnparseableDelta {
                    reason: e.to_string(),
                    original: call.function.arguments.clone(),
                    cleaned: call.function.arguments,
                }
            })?;
            return Ok((DeltaOutcome::Structured(delta), self.backend_model.clone()));
        }

        let text = message.content.unwrap_or_default();
        Ok((DeltaOutcome::Text(text), self.backend_model.clone()))
    }
}

fn parse_sse_chunk(bytes: &[u8]) -> Vec<StreamEvent> {
    let text = String::from_utf8_lossy(bytes);
    let mut events = Vec::new();
    for line in text.lines() {
        let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            events.push(StreamEvent::Done);
            continue;
        }
        match serde_json::from_str::<StreamChunkWire>(data) {
            Ok(chunk) => {
                for choice in chunk.choices {
                    if let Some(content) = choice.delta.content {
                        events.push(StreamEvent::ContentDelta(content));
                    }
                }
            }
            Err(e) => events.push(StreamEvent::Error(e.to_string())),
        }
    }
    events
}

fn map_reqwest_err(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::RequestFailed(e.to_string())
    }
}
