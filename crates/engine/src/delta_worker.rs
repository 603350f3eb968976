//! Component F: deterministic delta application (spec §4.F).
//!
//! Three phases, always run in this order and always total (no phase can
//! fail on a well-formed `GameState` + `Scenario` pair):
//!
//! 1. **vars** — `delta.set_vars` is merged into `state.vars`, then the
//!    turn counters advance. Conditionals are evaluated against
//!    post-increment counters (spec §9 decided this explicitly: "counter
//!    matches see the incremented value, not the pre-turn one").
//! 2. **conditionals & story events** — every conditional in the active
//!    scene plus the scenario's global `contingency_rules` is checked in
//!    authoring order; the last one that matches wins per-field. Story
//!    events fire at most once per scene and queue their prompt for the
//!    *next* narration call rather than the current one.
//! 3. **apply** — item/npc events, location/scene changes (delta and
//!    conditional-sourced, conditional wins when both are present) and
//!    `game_ended` are written back onto the state.

use storyengine_domain::{GameError, GameState, Npc, Scenario, Then, WorldLocation};
use storyengine_shared::{Container, ContainerRef, GameStateDelta, ItemAction, ItemEvent, NpcEvent};

/// Applies one turn's delta to `state` in place. `state.scenario_ref` must
/// match `scenario.id`; callers own that invariant (it's checked once at
/// `GameState::from_scenario_opening` time and never changes after).
pub fn apply_delta(
    state: &mut GameState,
    scenario: &Scenario,
    delta: &GameStateDelta,
) -> Result<(), GameError> {
    if state.is_ended {
        return Ok(());
    }

    apply_vars(state, delta);
    state.increment_turn_counters();

    let effects = evaluate_conditionals(state, scenario);
    fire_story_events(state, scenario);

    let scene_change = effects
        .scene_change
        .clone()
        .or_else(|| delta.scene_change.clone());
    let game_ended = effects.game_ended || delta.game_ended;
    if let Some(prompt) = &effects.prompt {
        state.queued_story_events.push(prompt.clone());
    }

    if let Some(location) = &delta.user_location {
        set_location(state, location);
    }
    for item_event in &delta.item_events {
        apply_item_event(state, item_event);
    }
    for npc_event in &delta.npc_events {
        apply_npc_event(state, npc_event);
    }
    if let Some(scene_id) = &scene_change {
        state.load_scene(scenario, scene_id)?;
    }
    if game_ended {
        state.is_ended = true;
    }

    Ok(())
}

fn apply_vars(state: &mut GameState, delta: &GameStateDelta) {
    for (k, v) in &delta.set_vars {
        state.vars.insert(k.clone(), v.clone());
    }
}

/// Folds every matching conditional's `Then` into one, later matches
/// overwriting earlier ones field-by-field (spec §4.F phase 2, §9).
fn evaluate_conditionals(state: &GameState, scenario: &Scenario) -> Then {
    let mut accumulated = Then::default();
    let scene = scenario.scene(&state.scene_name);
    let scene_rules = scene.map(|s| s.conditionals.iter()).into_iter().flatten();
    let global_rules = scenario.contingency_rules.iter();

    for conditional in scene_rules.chain(global_rules) {
        if !matches_when(state, &conditional.when) {
            continue;
        }
        if conditional.then.scene_change.is_some() {
            accumulated.scene_change = conditional.then.scene_change.clone();
        }
        if conditional.then.game_ended {
            accumulated.game_ended = true;
        }
        if conditional.then.prompt.is_some() {
            accumulated.prompt = conditional.then.prompt.clone();
        }
    }
    accumulated
}

/// Queues each not-yet-triggered story event in the active scene whose
/// `when` matches, marking it triggered so it won't repeat this scene
/// (spec §4.F phase 3, §8 property 13).
fn fire_story_events(state: &mut GameState, scenario: &Scenario) {
    let Some(scene) = scenario.scene(&state.scene_name) else {
        return;
    };
    let mut newly_triggered = Vec::new();
    let mut prompts = Vec::new();
    for (event_id, event) in scene.story_events.iter() {
        if state.triggered_story_events.contains(event_id) {
            continue;
        }
        if matches_when(state, &event.when) {
            prompts.push(event.prompt.clone());
            newly_triggered.push(event_id.clone());
        }
    }
    state.queued_story_events.extend(prompts);
    state.triggered_story_events.extend(newly_triggered);
}

fn matches_when(state: &GameState, when: &storyengine_domain::When) -> bool {
    if when.is_empty() {
        return false;
    }
    for (key, expected) in &when.vars {
        if state.vars.get(key) != Some(expected) {
            return false;
        }
    }
    if let Some(counter) = &when.scene_turn_counter {
        if !counter.matches(state.scene_turn_counter) {
            return false;
        }
    }
    if let Some(counter) = &when.turn_counter {
        if !counter.matches(state.turn_counter) {
            return false;
        }
    }
    if let Some(min) = when.min_scene_turns {
        if state.scene_turn_counter < min {
            return false;
        }
    }
    if let Some(min) = when.min_turns {
        if state.turn_counter < min {
            return false;
        }
    }
    if let Some(location) = &when.location {
        if &state.location != location {
            return false;
        }
    }
    true
}

/// An unknown location is a warned no-op, never an abort: every other
/// effect in this delta still has to land (spec §4.F "every phase is
/// total").
fn set_location(state: &mut GameState, location: &str) {
    if !state.world_locations.contains_key(location) {
        tracing::warn!(location, "delta referenced an unknown location, ignoring");
        return;
    }
    state.location = location.to_string();
}

/// Moves `item` between its authored containers, mutating inventory,
/// `world_locations[..].items` and `npcs[..].items` as needed (spec §4.F
/// "Apply" item events table).
fn apply_item_event(state: &mut GameState, event: &ItemEvent) {
    // `None` when there's nothing to remove from in the first place, so
    // the add below still proceeds.
    let removed = event
        .from
        .as_ref()
        .map(|from| remove_from_container(state, from, &event.item));

    match event.action {
        ItemAction::Use if !event.consumed => {
            if let Some(from) = &event.from {
                add_to_container(state, from, &event.item);
            }
        }
        ItemAction::Use => {}
        ItemAction::Drop | ItemAction::Give | ItemAction::Move | ItemAction::Acquire => {
            if removed == Some(false) {
                // Re-applying an already-applied delta: the item is no
                // longer in `from`, so adding it again would duplicate it
                // (spec §8 property 10, re-application must be a no-op).
                tracing::warn!(item = %event.item, "item not found in source container, skipping add");
                return;
            }
            let to = event.to.clone().unwrap_or_else(ContainerRef::player);
            add_to_container(state, &to, &event.item);
        }
    }
}

/// Removes `item` from `container`, returning whether it was actually
/// present.
fn remove_from_container(state: &mut GameState, container: &ContainerRef, item: &str) -> bool {
    match container.kind {
        Container::Player => {
            let before = state.inventory.len();
            state.inventory.retain(|i| i != item);
            state.inventory.len() != before
        }
        Container::Npc => {
            let Some(name) = &container.name else { return false };
            let Some(npc) = state.npcs.get_mut(name) else { return false };
            let before = npc.items.len();
            npc.items.retain(|i| i != item);
            npc.items.len() != before
        }
        Container::Location => {
            let Some(name) = &container.name else { return false };
            let Some(loc) = state.world_locations.get_mut(name) else { return false };
            let before = loc.items.len();
            loc.items.retain(|i| i != item);
            loc.items.len() != before
        }
    }
}

fn add_to_container(state: &mut GameState, container: &ContainerRef, item: &str) {
    match container.kind {
        Container::Player => state.inventory.push(item.to_string()),
        Container::Npc => {
            if let Some(name) = &container.name {
                state
                    .npcs
                    .entry(name.clone())
                    .or_insert_with(|| Npc {
                        name: name.clone(),
                        disposition: String::new(),
                        description: String::new(),
                        location: state.location.clone(),
                        important: false,
                        items: Vec::new(),
                    })
                    .items
                    .push(item.to_string());
            }
        }
        Container::Location => {
            if let Some(name) = &container.name {
                state
                    .world_locations
                    .entry(name.clone())
                    .or_insert_with(|| WorldLocation {
                        description: String::new(),
                        exits: Vec::new(),
                        blocked_exits: Vec::new(),
                        items: Vec::new(),
                    })
                    .items
                    .push(item.to_string());
            }
        }
    }
}

fn apply_npc_event(state: &mut GameState, event: &NpcEvent) {
    if let Some(npc) = state.npcs.get_mut(&event.npc_id) {
        npc.location = event.set_location.clone();
    }
}
