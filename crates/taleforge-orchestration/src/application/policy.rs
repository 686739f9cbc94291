//! The canonical turn policy.
//!
//! One player action flows through:
//!
//! 1. dialogue: a directly addressed NPC answers and the action ends;
//! 2. the acting agent, followed by a reload of the authoritative game;
//! 3. the combat-start branch, dispatched on whose turn opens the encounter;
//! 4. automatic end of combat once no enemy remains;
//! 5. bounded auto-continuation through NPC and monster turns;
//! 6. the return to narrative mode after combat ends.

use std::sync::Arc;

use crate::application::config::OrchestratorConfig;
use crate::application::services::Services;
use crate::application::steps::{
    AutoEndCombat, BeginDialogue, BroadcastCombatStart, BuildContext, CloseStaleDialogue,
    DetectDialogueTargets, EnrichContext, ExecuteAgent, ExecuteDialogueAgent, ExecuteNpcTurn,
    Halt, PromptNpcTurn, PromptPlayerTurn, ReloadState, SelectAgent, SuggestAllyAction,
    TransitionToNarrative, WrapAllyAction,
};
use crate::domain::conditional::{ConditionalStep, guard};
use crate::domain::guards::{
    combat_just_ended, combat_just_started, combat_loop_should_continue, has_dialogue_targets,
    is_current_turn_ally, is_current_turn_npc_or_monster, is_player_turn, no_enemies_remaining,
};
use crate::domain::pipeline::Pipeline;
use crate::domain::step::{SharedStep, shared};

/// Reason recorded when a dialogue reply ends the action.
pub const DIALOGUE_HALT: &str = "dialogue reply ends the action";
/// Reason recorded when an ally suggestion awaits the player.
pub const ALLY_SUGGESTION_HALT: &str = "awaiting player decision on ally suggestion";
/// Reason recorded when the player has been asked for their combat action.
pub const PLAYER_TURN_HALT: &str = "awaiting player combat action";

fn ally_suggestion(services: &Arc<Services>, name: &str) -> SharedStep {
    shared(ConditionalStep::new(
        name,
        guard(is_current_turn_ally),
        vec![
            shared(SuggestAllyAction::new(Arc::clone(services))),
            shared(Halt::new(ALLY_SUGGESTION_HALT)),
        ],
    ))
}

fn npc_turn(services: &Arc<Services>, name: &str) -> SharedStep {
    shared(ConditionalStep::new(
        name,
        guard(is_current_turn_npc_or_monster),
        vec![
            shared(PromptNpcTurn::new(Arc::clone(services))),
            shared(ExecuteNpcTurn::new(Arc::clone(services))),
            shared(ReloadState::new(Arc::clone(services))),
        ],
    ))
}

fn auto_end(services: &Arc<Services>) -> SharedStep {
    shared(ConditionalStep::new(
        "auto_end_check",
        guard(no_enemies_remaining),
        vec![shared(AutoEndCombat::new(Arc::clone(services)))],
    ))
}

/// Assembles the pipeline that processes one player action.
#[must_use]
pub fn turn_pipeline(services: &Arc<Services>, config: &OrchestratorConfig) -> Pipeline {
    let s = services;
    Pipeline::builder()
        .step(DetectDialogueTargets::new(Arc::clone(s)))
        .when(
            "dialogue_turn",
            guard(has_dialogue_targets),
            vec![
                shared(BeginDialogue::new(Arc::clone(s))),
                shared(ExecuteDialogueAgent::new(Arc::clone(s))),
                shared(ReloadState::new(Arc::clone(s))),
                shared(Halt::new(DIALOGUE_HALT)),
            ],
        )
        .step(CloseStaleDialogue::new(Arc::clone(s)))
        .step(WrapAllyAction)
        .step(SelectAgent)
        .step(BuildContext::new(Arc::clone(s)))
        .step(EnrichContext::new(Arc::clone(s)))
        .step(ExecuteAgent::new(Arc::clone(s)))
        .step(ReloadState::new(Arc::clone(s)))
        .when(
            "combat_start",
            guard(combat_just_started),
            vec![
                shared(BroadcastCombatStart::new(Arc::clone(s))),
                ally_suggestion(s, "combat_start_ally"),
                shared(ConditionalStep::new(
                    "combat_start_player",
                    guard(is_player_turn),
                    vec![
                        shared(PromptPlayerTurn::new(Arc::clone(s))),
                        shared(Halt::new(PLAYER_TURN_HALT)),
                    ],
                )),
                npc_turn(s, "combat_start_npc"),
            ],
        )
        .steps([auto_end(s)])
        .repeat_while(
            "combat_auto_continue",
            guard(combat_loop_should_continue),
            vec![
                shared(ReloadState::new(Arc::clone(s))),
                auto_end(s),
                ally_suggestion(s, "auto_continue_ally"),
                npc_turn(s, "auto_continue_npc"),
            ],
            config.max_combat_iterations,
        )
        .when(
            "combat_end",
            guard(combat_just_ended),
            vec![shared(TransitionToNarrative::new(Arc::clone(s)))],
        )
        .build()
}
