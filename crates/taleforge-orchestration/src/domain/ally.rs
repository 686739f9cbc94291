//! Ally-action rewriting.
//!
//! When it is an allied NPC's combat turn, the player's message is an order
//! for that ally. It is rewritten into an explicit directive so the combat
//! agent resolves the ally's action and advances the turn.

use taleforge_combat::domain::participant::Faction;
use taleforge_core::error::DomainError;
use taleforge_game::state::GameState;

/// Prefix marking a message that is already an ally directive.
pub const ALLY_ACTION_TAG: &str = "[ALLY ACTION]";

/// Rewrites `message` if it is an order for the ally whose turn it is.
///
/// Returns `Ok(None)` when combat is inactive, the current turn is not an
/// ally's, or the message is already tagged.
///
/// # Errors
///
/// Returns `DomainError::StateConsistency` if the acting ally is not a known
/// NPC or is not a party member; the combat tracker and the roster have
/// diverged.
pub fn ally_action_directive(
    game: &GameState,
    message: &str,
) -> Result<Option<String>, DomainError> {
    if !game.combat.is_active || message.trim_start().starts_with(ALLY_ACTION_TAG) {
        return Ok(None);
    }
    let Some(ally) = game
        .combat
        .current_turn()
        .filter(|p| p.faction == Faction::Ally)
    else {
        return Ok(None);
    };

    let npc = game.npc(&ally.entity_id).ok_or_else(|| {
        DomainError::StateConsistency(format!(
            "ally {} has the turn but is not a known NPC",
            ally.entity_id
        ))
    })?;
    if !game.is_party_member(&npc.id) {
        return Err(DomainError::StateConsistency(format!(
            "ally {} has the turn but is not in the party",
            npc.id
        )));
    }

    Ok(Some(format!(
        "{ALLY_ACTION_TAG} It is {name}'s turn (npc id: {id}). The player directs {name}: \
         \"{message}\". Resolve {name}'s action, then advance to the next turn.",
        name = npc.name,
        id = npc.id,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleforge_test_support::fixtures;

    fn ally_turn() -> GameState {
        let mut game = fixtures::game_in_combat(&["pc", "bram", "goblin"]);
        fixtures::set_turn(&mut game, "bram");
        game
    }

    #[test]
    fn test_rewrites_message_on_ally_turn() {
        // Arrange
        let game = ally_turn();

        // Act
        let directive = ally_action_directive(&game, "Bram, flank the goblin").unwrap();

        // Assert
        let directive = directive.expect("ally turn should rewrite");
        assert!(directive.starts_with(ALLY_ACTION_TAG));
        assert!(directive.contains("Bram"));
        assert!(directive.contains("npc id: bram"));
        assert!(directive.contains("Bram, flank the goblin"));
    }

    #[test]
    fn test_already_tagged_message_is_left_alone() {
        let game = ally_turn();

        let directive =
            ally_action_directive(&game, "[ALLY ACTION] Bram attacks").unwrap();

        assert_eq!(directive, None);
    }

    #[test]
    fn test_player_turn_and_inactive_combat_are_left_alone() {
        let player_turn = fixtures::game_in_combat(&["pc", "bram", "goblin"]);
        let mut ended = ally_turn();
        ended.end_combat();

        assert_eq!(ally_action_directive(&player_turn, "attack").unwrap(), None);
        assert_eq!(ally_action_directive(&ended, "attack").unwrap(), None);
    }

    #[test]
    fn test_ally_missing_from_roster_fails_fast() {
        // Arrange
        let mut game = ally_turn();
        game.npcs.retain(|npc| npc.id != "bram");

        // Act
        let result = ally_action_directive(&game, "attack");

        // Assert
        assert!(matches!(result, Err(DomainError::StateConsistency(_))));
    }

    #[test]
    fn test_ally_outside_party_fails_fast() {
        // Arrange
        let mut game = ally_turn();
        game.party.member_ids.clear();

        // Act
        let result = ally_action_directive(&game, "attack");

        // Assert
        assert!(matches!(result, Err(DomainError::StateConsistency(_))));
    }
}
