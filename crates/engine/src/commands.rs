//! Command shortcuts (Component H, spec §4.H): a small set of player
//! inputs are answered directly from `GameState` without going anywhere
//! near the LLM. Recognition is case-insensitive and whitespace-trimmed;
//! anything that doesn't match falls through to the normal turn pipeline.

use storyengine_domain::GameState;

/// A shortcut's canned reply. The caller appends it to `chat_history` as
/// an assistant turn the same way a narration reply would be, but skips
/// the narration call, the delta call, and the turn-counter increment
/// (spec §4.H: "shortcuts are read-only and do not advance the story").
pub fn try_shortcut(state: &GameState, input: &str) -> Option<String> {
    match input.trim().to_lowercase().as_str() {
        "look" | "l" | "location" => Some(describe_location(state)),
        "inventory" | "i" => Some(describe_inventory(state)),
        _ => None,
    }
}

fn describe_location(state: &GameState) -> String {
    match state.world_locations.get(&state.location) {
        Some(loc) => format!("{}: {}", state.location, loc.description),
        None => "unknown location".to_string(),
    }
}

fn describe_inventory(state: &GameState) -> String {
    if state.inventory.is_empty() {
        "Your inventory is empty.".to_string()
    } else {
        state
            .inventory
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
