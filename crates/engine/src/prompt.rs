//! Prompt assembler (Component D, spec §4.D): turns a `GameState` plus
//! the player's input into the two distinct message lists the turn
//! pipeline sends to the LLM — one for narration, one for delta
//! extraction.

use storyengine_domain::{ChatMessage, GameState, Role, Scenario};

use crate::config::TurnConfig;
use crate::llm::{LlmMessage, LlmRole};

/// Builds the narration call's message list (spec §4.D step-by-step):
/// a system message carrying scenario background + active scene
/// instructions + contingency prompts, the most recent `history_pairs`
/// turns of `chat_history`, any queued story-event prompts (consumed at
/// most once — spec §4.F phase 3), and the player's new input as the
/// final user message.
pub fn assemble_narration(
    state: &GameState,
    scenario: &Scenario,
    turn: &TurnConfig,
    player_input: &str,
) -> Vec<LlmMessage> {
    let mut messages = vec![LlmMessage::system(narrator_system_prompt(state, scenario))];

    for event_prompt in &state.queued_story_events {
        messages.push(LlmMessage::system(event_prompt.clone()));
    }

    messages.extend(recent_history(state, turn.history_pairs));
    messages.push(LlmMessage::user(player_input.to_string()));
    messages.push(LlmMessage::system(USER_POST_INSTRUCTIONS.to_string()));
    messages
}

/// Builds the delta-extraction call's message list: the same narration
/// system context plus the just-produced narration turn (user input +
/// assistant reply), followed by an explicit instruction to emit only
/// the structured delta (spec §4.D, §4.E). This is a distinct call from
/// narration, not a continuation of the same conversation, so the model
/// isn't tempted to narrate again.
pub fn assemble_delta_extraction(
    state: &GameState,
    scenario: &Scenario,
    player_input: &str,
    narration_reply: &str,
) -> Vec<LlmMessage> {
    vec![
        LlmMessage::system(narrator_system_prompt(state, scenario)),
        LlmMessage::system(DELTA_EXTRACTION_INSTRUCTIONS.to_string()),
        LlmMessage::user(player_input.to_string()),
        LlmMessage::assistant(narration_reply.to_string()),
    ]
}

const DELTA_EXTRACTION_INSTRUCTIONS: &str = "Review the turn above. Report only the state \
changes it implies (variable updates, location changes, item or npc events, whether the game \
has ended). Do not narrate. Do not invent changes the turn didn't establish.";

/// Appended after the player's input so it can't be mistaken for part of
/// the fiction (spec §4.D step 5).
const USER_POST_INSTRUCTIONS: &str = "Respond in character as the narrator. Keep the reply \
grounded in the state snapshot above; do not contradict it.";

fn narrator_system_prompt(state: &GameState, scenario: &Scenario) -> String {
    let mut parts = vec![scenario.story_background.clone()];
    if let Some(scene) = scenario.scene(&state.scene_name) {
        if !scene.instructions.is_empty() {
            parts.push(scene.instructions.clone());
        }
    }
    parts.extend(state.contingency_prompts.iter().cloned());
    parts.retain(|p| !p.trim().is_empty());
    parts.push(state_snapshot_json(state));
    parts.join("\n\n")
}

/// A compact JSON view of the state the narrator needs to stay grounded:
/// location, inventory, active scene, and NPCs currently in that location
/// (spec §4.D step 1).
fn state_snapshot_json(state: &GameState) -> String {
    let visible_npcs: Vec<&str> = state
        .npcs
        .values()
        .filter(|npc| npc.location == state.location)
        .map(|npc| npc.name.as_str())
        .collect();

    let snapshot = serde_json::json!({
        "location": state.location,
        "inventory": state.inventory,
        "scene": state.scene_name,
        "visible_npcs": visible_npcs,
    });
    format!("Current game state: {snapshot}")
}

/// Last `history_pairs` user/assistant pairs (`2 * history_pairs` messages),
/// oldest first, excluding the opening prompt row only when it would push
/// the window past its cap (spec §4.D: "a bounded trailing window").
fn recent_history(state: &GameState, history_pairs: usize) -> Vec<LlmMessage> {
    let window = history_pairs.saturating_mul(2);
    let start = state.chat_history.len().saturating_sub(window);
    state.chat_history[start..]
        .iter()
        .map(to_llm_message)
        .collect()
}

fn to_llm_message(msg: &ChatMessage) -> LlmMessage {
    let role = match msg.role {
        Role::User => LlmRole::User,
        Role::Assistant => LlmRole::Assistant,
        Role::System => LlmRole::System,
    };
    LlmMessage {
        role,
        content: msg.content.clone(),
    }
}
