//! Turn orchestrator (Component G, spec §4.G): the chat turn pipeline.
//!
//! A turn has a foreground half (narration, committed to storage, returned
//! to the caller) and a background half (delta extraction + deterministic
//! application) that the caller never waits on. The background half
//! checks its cancellation token before every write so a superseded turn
//! (the player sent another message before this one's delta finished)
//! never clobbers newer state (spec §5).

use std::sync::Arc;

use storyengine_domain::{ChatMessage, GameId};
use storyengine_shared::{GameEvent, GameStateDelta};
use tokio::time::timeout;

use crate::commands::try_shortcut;
use crate::delta_worker::apply_delta;
use crate::error::EngineError;
use crate::llm::{recover_json, DeltaOutcome};
use crate::prompt::{assemble_delta_extraction, assemble_narration};
use crate::state::AppState;

/// Runs one chat turn and returns the text the caller shows the player.
/// Delta extraction and application continue after this returns (spec
/// §4.G: "the narration reply is authoritative for the player-visible
/// transcript before the delta has even started").
pub async fn run_turn(
    state: Arc<AppState>,
    game_id: GameId,
    player_input: String,
) -> Result<String, EngineError> {
    state.events.publish(game_id, GameEvent::RequestQueued);

    let mut game = state
        .storage
        .load_game(&game_id)
        .await
        .map_err(|_| EngineError::GameNotFound(game_id.to_string()))?;

    // An ended game still narrates one final message (spec §3), it just
    // never reaches the background delta half below.
    let already_ended = game.is_ended;

    if let Some(reply) = try_shortcut(&game, &player_input) {
        game.chat_history.push(ChatMessage::user(player_input));
        game.chat_history.push(ChatMessage::assistant(reply.clone()));
        state.storage.save_game(&game).await?;
        state
            .events
            .publish(game_id, GameEvent::RequestCompleted { message: reply.clone() });
        return Ok(reply);
    }

    state.events.publish(game_id, GameEvent::RequestProcessing);
    let scenario = state.get_scenario(&game.scenario_ref).await?;

    let narration_messages = assemble_narration(&game, &scenario, &state.config.turn, &player_input);
    // Consumed: cleared the same turn they're injected (spec §4.D step 4).
    game.queued_story_events.clear();

    let narration_reply = timeout(
        state.config.llm.narration_timeout,
        state.llm.chat(&narration_messages, 0.9),
    )
    .await
    .map_err(|_| EngineError::Llm(crate::llm::LlmError::Timeout))?
    .map_err(|e| {
        state
            .events
            .publish(game_id, GameEvent::RequestFailed { error: e.to_string() });
        EngineError::Llm(e)
    })?;

    game.chat_history.push(ChatMessage::user(player_input.clone()));
    game.chat_history
        .push(ChatMessage::assistant(narration_reply.clone()));
    state.storage.save_game(&game).await?;
    state.events.publish(
        game_id,
        GameEvent::RequestCompleted {
            message: narration_reply.clone(),
        },
    );

    if already_ended {
        // One final narrated reply is all an ended game gets (spec §3,
        // Testable Scenario S5); no background task, no turn advance.
        return Ok(narration_reply);
    }

    let cancel_token = state.cancel.supersede(game_id);
    let background_state = state.clone();
    let background_input = player_input;
    let background_reply = narration_reply.clone();
    tokio::spawn(async move {
        run_background_delta(
            background_state,
            game_id,
            background_input,
            background_reply,
            cancel_token,
        )
        .await;
    });

    Ok(narration_reply)
}

/// Steps a–f of spec §4.G's background half: assemble the reducer
/// prompt, call the model, recover/parse its output, reload-mutate-save
/// the game state, and publish `game.state_updated` — all best-effort,
/// since a failure here is silent to the player (spec §7).
async fn run_background_delta(
    state: Arc<AppState>,
    game_id: GameId,
    player_input: String,
    narration_reply: String,
    cancel_token: tokio_util::sync::CancellationToken,
) {
    if cancel_token.is_cancelled() {
        return;
    }

    let delta = match extract_delta(&state, game_id, &player_input, &narration_reply).await {
        Ok(delta) => delta,
        Err(e) => {
            tracing::warn!(game_id = %game_id, error = %e, "background delta extraction failed");
            return;
        }
    };

    if cancel_token.is_cancelled() {
        return;
    }

    let Ok(mut game) = state.storage.load_game(&game_id).await else {
        tracing::warn!(game_id = %game_id, "background delta: game vanished before apply");
        return;
    };
    let Ok(scenario) = state.get_scenario(&game.scenario_ref).await else {
        tracing::warn!(game_id = %game_id, "background delta: scenario vanished before apply");
        return;
    };

    if let Err(e) = apply_delta(&mut game, &scenario, &delta) {
        tracing::warn!(game_id = %game_id, error = %e, "background delta application failed");
        return;
    }

    if cancel_token.is_cancelled() {
        return;
    }

    if let Err(e) = state.storage.save_game(&game).await {
        tracing::warn!(game_id = %game_id, error = %e, "background delta: save failed");
        return;
    }

    state.events.publish(
        game_id,
        GameEvent::GameStateUpdated {
            turn: game.turn_counter,
            location: game.location.clone(),
        },
    );
}

async fn extract_delta(
    state: &AppState,
    game_id: GameId,
    player_input: &str,
    narration_reply: &str,
) -> Result<GameStateDelta, EngineError> {
    let game = state.storage.load_game(&game_id).await?;
    let scenario = state.get_scenario(&game.scenario_ref).await?;
    let messages = assemble_delta_extraction(&game, &scenario, player_input, narration_reply);

    let (outcome, _model_used) = timeout(state.config.llm.delta_timeout, state.llm.delta_update(&messages))
        .await
        .map_err(|_| EngineError::Llm(crate::llm::LlmError::Timeout))?
        .map_err(EngineError::Llm)?;

    match outcome {
        DeltaOutcome::Structured(delta) => Ok(delta),
        DeltaOutcome::Text(raw) => {
            let cleaned = recover_json(&raw).map_err(|reason| {
                EngineError::Llm(crate::llm::LlmError::UnparseableDelta {
                    reason,
                    original: raw.clone(),
                    cleaned: raw.clone(),
                })
            })?;
            serde_json::from_str(&cleaned).map_err(|e| {
                EngineError::Llm(crate::llm::LlmError::UnparseableDelta {
                    reason: e.to_string(),
                    original: raw,
                    cleaned,
                })
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmAdapter, LlmError, LlmMessage};
    use crate::storage::InMemoryStorage;
    use async_trait::async_trait;
    use futures_util::stream::BoxStream;
    use std::time::Duration;
    use storyengine_domain::fixtures::minimal_scenario;
    use storyengine_domain::GameState;

    struct StubAdapter {
        narration: String,
        delta_json: String,
    }

    #[async_trait]
    impl LlmAdapter for StubAdapter {
        async fn chat(&self, _messages: &[LlmMessage], _temperature: f32) -> Result<String, LlmError> {
            Ok(self.narration.clone())
        }

        async fn chat_stream(
            &self,
            _messages: &[LlmMessage],
            _temperature: f32,
        ) -> Result<BoxStream<'static, crate::llm::StreamEvent>, LlmError> {
            Err(LlmError::RequestFailed("not used in tests".to_string()))
        }

        async fn delta_update(
            &self,
            _messages: &[LlmMessage],
        ) -> Result<(crate::llm::DeltaOutcome, String), LlmError> {
            Ok((
                crate::llm::DeltaOutcome::Text(self.delta_json.clone()),
                "stub-model".to_string(),
            ))
        }
    }

    fn test_config() -> crate::config::AppConfig {
        crate::config::AppConfig {
            server_port: 0,
            cors_allowed_origins: vec![],
            llm: crate::config::LlmConfig {
                base_url: "http://localhost".to_string(),
                api_key: String::new(),
                primary_model: "stub".to_string(),
                backend_model: None,
                mature_models: vec![],
                narration_timeout: Duration::from_secs(5),
                delta_timeout: Duration::from_secs(5),
            },
            turn: crate::config::TurnConfig {
                history_pairs: 10,
                sse_keepalive: Duration::from_secs(30),
            },
        }
    }

    #[tokio::test]
    async fn narration_is_returned_and_committed_before_delta_runs() {
        let scenario = minimal_scenario();
        let game = GameState::from_scenario_opening(GameId::new(), &scenario, "stub").unwrap();
        let game_id = game.id;

        let storage = Arc::new(InMemoryStorage::new().with_scenario(scenario));
        storage.save_game(&game).await.unwrap();

        let adapter = Arc::new(StubAdapter {
            narration: "You step into the cold night.".to_string(),
            delta_json: r#"{"set_vars":{"outside":"true"}}"#.to_string(),
        });

        let state = Arc::new(AppState::new(test_config(), storage.clone(), adapter));
        let reply = run_turn(state.clone(), game_id, "go outside".to_string())
            .await
            .unwrap();
        assert_eq!(reply, "You step into the cold night.");

        let committed = storage.load_game(&game_id).await.unwrap();
        assert_eq!(committed.chat_history.len(), 3);
    }

    #[tokio::test]
    async fn shortcut_input_never_reaches_the_llm() {
        let scenario = minimal_scenario();
        let game = GameState::from_scenario_opening(GameId::new(), &scenario, "stub").unwrap();
        let game_id = game.id;

        let storage = Arc::new(InMemoryStorage::new().with_scenario(scenario));
        storage.save_game(&game).await.unwrap();

        let adapter = Arc::new(StubAdapter {
            narration: "should not be used".to_string(),
            delta_json: "{}".to_string(),
        });
        let state = Arc::new(AppState::new(test_config(), storage.clone(), adapter));

        let reply = run_turn(state, game_id, "look".to_string()).await.unwrap();
        assert!(reply.contains("warm inn"));
    }

    #[tokio::test]
    async fn ended_game_narrates_once_more_without_advancing_turn_counter() {
        let scenario = minimal_scenario();
        let mut game = GameState::from_scenario_opening(GameId::new(), &scenario, "stub").unwrap();
        game.is_ended = true;
        let game_id = game.id;

        let storage = Arc::new(InMemoryStorage::new().with_scenario(scenario));
        storage.save_game(&game).await.unwrap();

        let adapter = Arc::new(StubAdapter {
            narration: "The story is already over.".to_string(),
            delta_json: "{}".to_string(),
        });
        let state = Arc::new(AppState::new(test_config(), storage.clone(), adapter));

        let reply = run_turn(state, game_id, "anything".to_string())
            .await
            .unwrap();
        assert_eq!(reply, "The story is already over.");

        let committed = storage.load_game(&game_id).await.unwrap();
        assert!(committed.is_ended);
        assert_eq!(committed.turn_counter, 0);
        assert_eq!(committed.chat_history.len(), 3);
    }
}
