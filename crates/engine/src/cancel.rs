//! Per-game supersede/cancel map (spec §5): every new chat turn for a
//! game replaces that game's previous cancellation token and cancels the
//! old one, so a background delta task left over from a superseded turn
//! stops applying its result once a newer turn has started.

use dashmap::DashMap;
use storyengine_domain::GameId;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct CancelMap {
    tokens: DashMap<GameId, CancellationToken>,
}

impl CancelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh token for `game_id`, cancelling and replacing
    /// whatever token was there before. Returns the new token, which the
    /// caller's background task should poll via `is_cancelled()` before
    /// writing its result back (spec §5: "single writer per game").
    pub fn supersede(&self, game_id: GameId) -> CancellationToken {
        let new_token = CancellationToken::new();
        if let Some((_, old)) = self.tokens.remove(&game_id) {
            old.cancel();
        }
        self.tokens.insert(game_id, new_token.clone());
        new_token
    }
}
