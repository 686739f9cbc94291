//! Canonical game fixtures.
//!
//! The roster is a player (`pc`, Aria), a party member (`bram`, Bram), a
//! neutral bystander (`sela`, Sela) and a monster (`goblin`, Goblin).

use taleforge_game::state::{GameState, Monster, Npc, PlayerCharacter, Scenario};

use crate::rng::MockRng;

/// Identifier of the fixture game.
pub const GAME_ID: &str = "game-1";

/// A fresh exploration-phase game with the standard roster.
#[must_use]
pub fn game() -> GameState {
    let mut game = GameState::new(
        GAME_ID,
        PlayerCharacter {
            id: "pc".to_owned(),
            name: "Aria".to_owned(),
            initiative_modifier: 3,
        },
    );
    game.npcs.push(Npc {
        id: "bram".to_owned(),
        name: "Bram".to_owned(),
        initiative_modifier: 1,
        is_hostile: false,
    });
    game.npcs.push(Npc {
        id: "sela".to_owned(),
        name: "Sela".to_owned(),
        initiative_modifier: 0,
        is_hostile: false,
    });
    game.party.member_ids.push("bram".to_owned());
    game.monsters.push(Monster {
        id: "goblin".to_owned(),
        name: "Goblin".to_owned(),
        initiative_modifier: 0,
    });
    game.scenario = Some(Scenario {
        title: "The Sunken Road".to_owned(),
        description: "Bandits have been seen near the old causeway.".to_owned(),
    });
    game
}

/// The fixture game in active combat with participants in exactly `order`.
///
/// Initiative values are assigned descending from 20 so the order survives
/// any later re-sort. The turn starts at the first entry.
///
/// # Panics
///
/// Panics if an id in `order` is not on the fixture roster.
#[must_use]
pub fn game_in_combat(order: &[&str]) -> GameState {
    let mut game = game();
    game.start_combat(order, &mut MockRng)
        .expect("fixture combat ids must be on the roster");
    game.combat.participants.sort_by_key(|p| {
        order
            .iter()
            .position(|id| *id == p.entity_id)
            .unwrap_or(usize::MAX)
    });
    for (rank, participant) in game.combat.participants.iter_mut().enumerate() {
        participant.initiative = Some(20 - i32::try_from(rank).unwrap_or(0));
    }
    game.combat.turn_index = 0;
    game
}

/// Moves the turn to `entity_id`.
///
/// # Panics
///
/// Panics if `entity_id` is not an active participant.
pub fn set_turn(game: &mut GameState, entity_id: &str) {
    let index = game
        .combat
        .active_participants()
        .position(|p| p.entity_id == entity_id)
        .expect("entity must be an active participant");
    game.combat.turn_index = index;
}
