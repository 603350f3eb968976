//! Application configuration, loaded from the environment.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP server port.
    pub server_port: u16,
    /// CORS allowed origins (comma-separated, or "*" for any).
    pub cors_allowed_origins: Vec<String>,

    pub llm: LlmConfig,
    pub turn: TurnConfig,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    /// Narration model (spec §4.E "primary").
    pub primary_model: String,
    /// Delta-extraction model. Falls back to `primary_model` when unset
    /// (spec §4.E: "If backend is unset, primary is used for both").
    pub backend_model: Option<String>,
    /// Models approved for "mature"/"adult" rated scenarios (spec §6).
    pub mature_models: Vec<String>,
    pub narration_timeout: Duration,
    pub delta_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// `N` in spec §4.D: how many recent chat_history pairs to include
    /// in an assembled prompt.
    pub history_pairs: usize,
    pub sse_keepalive: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            llm: LlmConfig {
                base_url: env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key: env::var("LLM_API_KEY").unwrap_or_default(),
                primary_model: env::var("LLM_PRIMARY_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                backend_model: env::var("LLM_BACKEND_MODEL").ok(),
                mature_models: env::var("LLM_MATURE_MODELS")
                    .unwrap_or_default()
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                narration_timeout: Duration::from_secs(
                    env::var("LLM_NARRATION_TIMEOUT_SECONDS")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .unwrap_or(30),
                ),
                delta_timeout: Duration::from_secs(
                    env::var("LLM_DELTA_TIMEOUT_SECONDS")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .unwrap_or(30),
                ),
            },

            turn: TurnConfig {
                history_pairs: env::var("TURN_HISTORY_PAIRS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                sse_keepalive: Duration::from_secs(
                    env::var("SSE_KEEPALIVE_SECONDS")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .unwrap_or(30),
                ),
            },
        })
    }
}
