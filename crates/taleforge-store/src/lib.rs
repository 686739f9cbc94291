//! Taleforge: in-memory implementation of the authoritative game store.
//!
//! [`InMemoryGameStore`] keeps the latest [`GameState`] per game together
//! with the ordered history of processed player actions.
//!
//! [`GameState`]: taleforge_game::state::GameState

mod memory;

pub use memory::{DEFAULT_HISTORY_LIMIT, InMemoryGameStore, TurnRecord};
