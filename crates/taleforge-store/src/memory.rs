//! `DashMap`-backed `GameService`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use taleforge_core::clock::SharedClock;
use taleforge_core::error::DomainError;
use taleforge_core::stream::StreamEvent;
use taleforge_game::ports::GameService;
use taleforge_game::state::GameState;
use tracing::debug;

/// One processed player action and the events it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnRecord {
    /// The player's message.
    pub user_message: String,
    /// Events emitted while processing it, in order.
    pub events: Vec<StreamEvent>,
    /// When the turn was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Turns kept per game unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Game states and turn histories held in process memory.
///
/// Each game keeps at most `history_limit` turns; older turns are dropped
/// first.
pub struct InMemoryGameStore {
    games: DashMap<String, GameState>,
    history: DashMap<String, Vec<TurnRecord>>,
    history_limit: usize,
    clock: SharedClock,
}

impl InMemoryGameStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            games: DashMap::new(),
            history: DashMap::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            clock,
        }
    }

    /// Keeps at most `limit` turns per game. A limit of 0 is treated as 1.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Number of stored games.
    #[must_use]
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Seeds or replaces a game. Returns `true` if a game was replaced.
    ///
    /// Replacing a game clears its turn history.
    pub fn put(&self, game: GameState) -> bool {
        let game_id = game.game_id.clone();
        let replaced = self.games.insert(game_id.clone(), game).is_some();
        self.history.remove(&game_id);
        debug!(game_id = %game_id, replaced, "game stored");
        replaced
    }

    /// Whether a game with `game_id` exists.
    #[must_use]
    pub fn contains(&self, game_id: &str) -> bool {
        self.games.contains_key(game_id)
    }

    /// Turn history for `game_id`, oldest first. Empty for unknown games.
    #[must_use]
    pub fn history(&self, game_id: &str) -> Vec<TurnRecord> {
        self.history
            .get(game_id)
            .map(|turns| turns.clone())
            .unwrap_or_default()
    }

    /// Applies `update` to the stored game in place and returns its result.
    ///
    /// The entry stays locked while `update` runs.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::GameNotFound` if the game does not exist.
    pub fn update<F, R>(&self, game_id: &str, update: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut GameState) -> R,
    {
        let mut game = self
            .games
            .get_mut(game_id)
            .ok_or_else(|| DomainError::GameNotFound(game_id.to_owned()))?;
        Ok(update(&mut game))
    }
}

impl std::fmt::Debug for InMemoryGameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryGameStore")
            .field("games", &self.games.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GameService for InMemoryGameStore {
    async fn get_game(&self, game_id: &str) -> Result<GameState, DomainError> {
        self.games
            .get(game_id)
            .map(|game| game.clone())
            .ok_or_else(|| DomainError::GameNotFound(game_id.to_owned()))
    }

    async fn save_game(&self, game: &GameState) -> Result<(), DomainError> {
        // Only seeded games can be saved.
        let mut stored = self
            .games
            .get_mut(&game.game_id)
            .ok_or_else(|| DomainError::GameNotFound(game.game_id.clone()))?;
        *stored = game.clone();
        Ok(())
    }

    async fn record_turn(
        &self,
        game_id: &str,
        user_message: &str,
        events: &[StreamEvent],
    ) -> Result<(), DomainError> {
        if !self.games.contains_key(game_id) {
            return Err(DomainError::GameNotFound(game_id.to_owned()));
        }
        let record = TurnRecord {
            user_message: user_message.to_owned(),
            events: events.to_vec(),
            recorded_at: self.clock.now(),
        };
        let mut turns = self.history.entry(game_id.to_owned()).or_default();
        turns.push(record);
        let overflow = turns.len().saturating_sub(self.history_limit);
        if overflow > 0 {
            turns.drain(..overflow);
        }
        Ok(())
    }
}
