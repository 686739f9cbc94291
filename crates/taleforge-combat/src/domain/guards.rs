//! Pure predicates over the combat tracker.
//!
//! `was_active` is whether combat was running when the current pipeline run
//! began; transition predicates compare it with the live state.

use super::participant::Faction;
use super::state::CombatState;

/// Combat went from inactive to active during this run.
#[must_use]
pub fn combat_just_started(was_active: bool, state: &CombatState) -> bool {
    !was_active && state.is_active
}

/// Combat went from active to inactive during this run.
#[must_use]
pub fn combat_just_ended(was_active: bool, state: &CombatState) -> bool {
    was_active && !state.is_active
}

/// Combat is running and no active ENEMY participant remains.
#[must_use]
pub fn no_enemies_remaining(state: &CombatState) -> bool {
    state.is_active
        && !state
            .active_participants()
            .any(|p| p.faction == Faction::Enemy)
}

/// The current turn belongs to an ALLY.
#[must_use]
pub fn is_current_turn_ally(state: &CombatState) -> bool {
    current_faction(state) == Some(Faction::Ally)
}

/// The current turn belongs to the PLAYER.
#[must_use]
pub fn is_player_turn(state: &CombatState) -> bool {
    current_faction(state) == Some(Faction::Player)
}

/// The current turn belongs to an ENEMY or NEUTRAL combatant.
#[must_use]
pub fn is_current_turn_npc_or_monster(state: &CombatState) -> bool {
    matches!(
        current_faction(state),
        Some(Faction::Enemy | Faction::Neutral)
    )
}

/// The auto-continuation loop should run another iteration.
///
/// ALLY turns are admitted so the loop can emit one suggestion and halt.
#[must_use]
pub fn combat_loop_should_continue(state: &CombatState) -> bool {
    matches!(current_faction(state), Some(faction) if faction != Faction::Player)
}

fn current_faction(state: &CombatState) -> Option<Faction> {
    if !state.is_active {
        return None;
    }
    state.current_turn().map(|p| p.faction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::participant::{EntityType, Participant};

    fn participant(id: &str, faction: Faction, is_active: bool) -> Participant {
        Participant {
            entity_id: id.to_owned(),
            entity_type: EntityType::Npc,
            faction,
            name: id.to_owned(),
            initiative: Some(10),
            is_player: faction == Faction::Player,
            is_active,
        }
    }

    fn state_with(participants: Vec<Participant>, turn_index: usize) -> CombatState {
        CombatState {
            is_active: true,
            turn_index,
            participants,
            ..CombatState::default()
        }
    }

    #[test]
    fn test_transition_predicates() {
        let active = state_with(vec![participant("a", Faction::Enemy, true)], 0);
        let inactive = CombatState::default();

        assert!(combat_just_started(false, &active));
        assert!(!combat_just_started(true, &active));
        assert!(combat_just_ended(true, &inactive));
        assert!(!combat_just_ended(false, &inactive));
        assert!(!combat_just_ended(true, &active));
    }

    #[test]
    fn test_no_enemies_remaining_false_while_any_enemy_active() {
        let state = state_with(
            vec![
                participant("pc", Faction::Player, true),
                participant("goblin", Faction::Enemy, false),
                participant("orc", Faction::Enemy, true),
            ],
            0,
        );
        assert!(!no_enemies_remaining(&state));
    }

    #[test]
    fn test_no_enemies_remaining_true_when_enemies_inactive_or_absent() {
        let all_down = state_with(
            vec![
                participant("pc", Faction::Player, true),
                participant("goblin", Faction::Enemy, false),
            ],
            0,
        );
        let none_present = state_with(vec![participant("pc", Faction::Player, true)], 0);

        assert!(no_enemies_remaining(&all_down));
        assert!(no_enemies_remaining(&none_present));
    }

    #[test]
    fn test_no_enemies_remaining_false_when_combat_inactive() {
        let mut state = state_with(vec![participant("pc", Faction::Player, true)], 0);
        state.is_active = false;
        assert!(!no_enemies_remaining(&state));
    }

    #[test]
    fn test_turn_classification_follows_current_faction() {
        let roster = vec![
            participant("pc", Faction::Player, true),
            participant("ally", Faction::Ally, true),
            participant("enemy", Faction::Enemy, true),
            participant("bystander", Faction::Neutral, true),
        ];

        let player = state_with(roster.clone(), 0);
        let ally = state_with(roster.clone(), 1);
        let enemy = state_with(roster.clone(), 2);
        let neutral = state_with(roster, 3);

        assert!(is_player_turn(&player));
        assert!(!combat_loop_should_continue(&player));

        assert!(is_current_turn_ally(&ally));
        assert!(combat_loop_should_continue(&ally));
        assert!(!is_current_turn_npc_or_monster(&ally));

        assert!(is_current_turn_npc_or_monster(&enemy));
        assert!(combat_loop_should_continue(&enemy));

        assert!(is_current_turn_npc_or_monster(&neutral));
    }

    #[test]
    fn test_classification_false_when_combat_inactive() {
        let mut state = state_with(vec![participant("enemy", Faction::Enemy, true)], 0);
        state.is_active = false;

        assert!(!is_current_turn_npc_or_monster(&state));
        assert!(!combat_loop_should_continue(&state));
    }
}
