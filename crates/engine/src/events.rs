//! Event broadcaster (Component I, spec §4.I): fire-and-forget,
//! at-most-once delivery per subscriber. A game with no subscribers simply
//! drops its events; a late subscriber never replays history.

use dashmap::DashMap;
use storyengine_domain::GameId;
use storyengine_shared::GameEvent;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct EventBroadcaster {
    channels: DashMap<GameId, broadcast::Sender<GameEvent>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a game's event stream, creating its channel on first
    /// use. The returned receiver only sees events published after this
    /// call (spec §4.I: "no replay").
    pub fn subscribe(&self, game_id: GameId) -> broadcast::Receiver<GameEvent> {
        self.channels
            .entry(game_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes an event. A `SendError` (no active subscribers) is not an
    /// error condition here — it's the common case between SSE connections
    /// (spec §4.I: "publishing never blocks and never fails the caller").
    pub fn publish(&self, game_id: GameId, event: GameEvent) {
        if let Some(sender) = self.channels.get(&game_id) {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.publish(GameId::new(), GameEvent::RequestQueued);
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let broadcaster = EventBroadcaster::new();
        let game_id = GameId::new();
        let mut rx = broadcaster.subscribe(game_id);

        broadcaster.publish(game_id, GameEvent::RequestProcessing);
        let received = rx.recv().await.unwrap();
        assert!(matches!(received, GameEvent::RequestProcessing));
    }

    #[tokio::test]
    async fn events_for_other_games_are_not_delivered() {
        let broadcaster = EventBroadcaster::new();
        let game_a = GameId::new();
        let game_b = GameId::new();
        let mut rx_a = broadcaster.subscribe(game_a);

        broadcaster.publish(game_b, GameEvent::RequestProcessing);
        assert!(rx_a.try_recv().is_err());
    }
}
