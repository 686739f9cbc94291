//! Context-level guard predicates.
//!
//! Thin adapters that read the live combat tracker through the context and
//! delegate to the pure predicates in `taleforge_combat::domain::guards`.

use taleforge_combat::domain::guards as combat;
use taleforge_combat::domain::state::CombatState;

use crate::domain::context::OrchestrationContext;

fn read_combat<R>(context: &OrchestrationContext, f: impl FnOnce(&CombatState) -> R) -> R {
    context.read_game(|game| f(&game.combat))
}

/// The player addressed at least one NPC directly.
#[must_use]
pub fn has_dialogue_targets(context: &OrchestrationContext) -> bool {
    !context.flags().dialogue_targets.is_empty()
}

#[must_use]
pub fn combat_just_started(context: &OrchestrationContext) -> bool {
    let was_active = context.flags().combat_was_active;
    read_combat(context, |state| combat::combat_just_started(was_active, state))
}

#[must_use]
pub fn combat_just_ended(context: &OrchestrationContext) -> bool {
    let was_active = context.flags().combat_was_active;
    read_combat(context, |state| combat::combat_just_ended(was_active, state))
}

#[must_use]
pub fn no_enemies_remaining(context: &OrchestrationContext) -> bool {
    read_combat(context, combat::no_enemies_remaining)
}

#[must_use]
pub fn is_current_turn_ally(context: &OrchestrationContext) -> bool {
    read_combat(context, combat::is_current_turn_ally)
}

#[must_use]
pub fn is_player_turn(context: &OrchestrationContext) -> bool {
    read_combat(context, combat::is_player_turn)
}

#[must_use]
pub fn is_current_turn_npc_or_monster(context: &OrchestrationContext) -> bool {
    read_combat(context, combat::is_current_turn_npc_or_monster)
}

#[must_use]
pub fn combat_loop_should_continue(context: &OrchestrationContext) -> bool {
    read_combat(context, combat::combat_loop_should_continue)
}
