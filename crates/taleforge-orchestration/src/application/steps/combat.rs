//! Combat turn handling.

use std::sync::Arc;

use async_trait::async_trait;
use taleforge_combat::domain::participant::{Faction, Participant};
use taleforge_core::error::DomainError;
use taleforge_core::stream::StreamEvent;
use taleforge_game::ports::AgentType;
use taleforge_game::state::{GamePhase, GameState};
use tracing::{debug, info, warn};

use crate::application::services::Services;
use crate::domain::context::{OrchestrationContext, PromptMarker};
use crate::domain::step::{Step, StepResult};

fn current_turn_in(
    context: &OrchestrationContext,
    factions: &[Faction],
) -> Result<(Participant, u32), DomainError> {
    context.read_game(|game| {
        game.combat
            .current_turn()
            .filter(|p| game.combat.is_active && factions.contains(&p.faction))
            .map(|p| (p.clone(), game.combat.round_number))
            .ok_or_else(|| {
                DomainError::StateConsistency(format!(
                    "expected an active {factions:?} turn in game {}",
                    game.game_id
                ))
            })
    })
}

async fn run_agent(
    services: &Services,
    context: OrchestrationContext,
    agent_type: AgentType,
    message: &str,
) -> Result<OrchestrationContext, DomainError> {
    let agent = services.agents.get(agent_type)?;
    let context_text =
        context.read_game(|game| services.context.build_context(game, message, agent_type));
    let events = agent
        .process(message, context.game(), &context_text, services.stream())
        .await?;
    services
        .emit(context.with_context_text(context_text), events)
        .await
}

fn initiative_summary(game: &GameState) -> String {
    game.combat
        .active_participants()
        .map(|p| match p.initiative {
            Some(initiative) => format!("{} ({initiative})", p.name),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Announces a new encounter and its initiative order.
#[derive(Debug, Clone)]
pub struct BroadcastCombatStart {
    services: Arc<Services>,
}

impl BroadcastCombatStart {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for BroadcastCombatStart {
    fn name(&self) -> &str {
        "broadcast_combat_start"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let update = context.read_game(|game| {
            game.combat_update(Some(format!(
                "Combat begins! Initiative order: {}.",
                initiative_summary(game)
            )))
        });
        info!(
            game_id = context.game_id(),
            round = update.round_number,
            "combat started"
        );
        let context = self
            .services
            .emit(context, vec![StreamEvent::CombatUpdate(update)])
            .await?;
        Ok(StepResult::continue_with(context))
    }
}

/// Proposes an action for the ally whose turn it is.
///
/// Pair with `Halt`: the player accepts or edits the suggestion next.
#[derive(Debug, Clone)]
pub struct SuggestAllyAction {
    services: Arc<Services>,
}

impl SuggestAllyAction {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for SuggestAllyAction {
    fn name(&self) -> &str {
        "suggest_ally_action"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let (ally, _) = current_turn_in(&context, &[Faction::Ally])?;
        let snapshot = context.game().snapshot();
        let suggestion = self.services.suggester.suggest(&snapshot, &ally).await?;
        debug!(
            game_id = context.game_id(),
            npc_id = %suggestion.npc_id,
            "ally suggestion generated"
        );
        let context = self
            .services
            .emit(context, vec![StreamEvent::CombatSuggestion(suggestion)])
            .await?;
        Ok(StepResult::continue_with(context))
    }
}

/// Has the combat agent ask the player for their action.
#[derive(Debug, Clone)]
pub struct PromptPlayerTurn {
    services: Arc<Services>,
}

impl PromptPlayerTurn {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for PromptPlayerTurn {
    fn name(&self) -> &str {
        "prompt_player_turn"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let (player, round) = current_turn_in(&context, &[Faction::Player])?;
        let prompt = format!(
            "Round {round}: it is {name}'s turn. Describe the battlefield and ask the player \
             what {name} does. Do not resolve any action yet.",
            name = player.name
        );
        let context = run_agent(&self.services, context, AgentType::Combat, &prompt).await?;
        Ok(StepResult::continue_with(context.with_current_prompt(prompt)))
    }
}

/// Announces an NPC or monster turn and prepares the prompt that resolves it.
///
/// A second prompt for the same entity in the same round means the previous
/// resolution never advanced the turn; the run halts instead of repeating it.
#[derive(Debug, Clone)]
pub struct PromptNpcTurn {
    services: Arc<Services>,
}

impl PromptNpcTurn {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for PromptNpcTurn {
    fn name(&self) -> &str {
        "prompt_npc_turn"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let (actor, round) = current_turn_in(&context, &[Faction::Enemy, Faction::Neutral])?;
        let marker = PromptMarker {
            entity_id: actor.entity_id.clone(),
            round,
        };
        if context.flags().last_prompted.as_ref() == Some(&marker) {
            warn!(
                game_id = context.game_id(),
                entity_id = %actor.entity_id,
                round,
                "turn was not advanced after resolution"
            );
            let reason = format!("turn did not advance past {}", actor.name);
            return Ok(StepResult::halt(context, reason));
        }

        let update =
            context.read_game(|game| game.combat_update(Some(format!("{}'s turn.", actor.name))));
        let prompt = format!(
            "Round {round}: resolve {name}'s turn (entity id: {id}). {name} acts now; \
             apply the outcome, then advance to the next turn.",
            name = actor.name,
            id = actor.entity_id
        );
        let flags = context.flags().clone().with_last_prompted(marker);
        let context = self
            .services
            .emit(context, vec![StreamEvent::CombatUpdate(update)])
            .await?;
        Ok(StepResult::continue_with(
            context.with_flags(flags).with_current_prompt(prompt),
        ))
    }
}

/// Has the combat agent resolve the prepared NPC or monster turn.
#[derive(Debug, Clone)]
pub struct ExecuteNpcTurn {
    services: Arc<Services>,
}

impl ExecuteNpcTurn {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for ExecuteNpcTurn {
    fn name(&self) -> &str {
        "execute_npc_turn"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let prompt = context
            .current_prompt()
            .map(str::to_owned)
            .ok_or_else(|| {
                DomainError::StateConsistency("npc turn executed without a prompt".to_owned())
            })?;
        let context = run_agent(&self.services, context, AgentType::Combat, &prompt).await?;
        Ok(StepResult::continue_with(context))
    }
}

/// Ends combat once no active enemy remains.
#[derive(Debug, Clone)]
pub struct AutoEndCombat {
    services: Arc<Services>,
}

impl AutoEndCombat {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for AutoEndCombat {
    fn name(&self) -> &str {
        "auto_end_combat"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        self.services
            .mutate_and_save(&context, |game| {
                game.end_combat();
                game.phase = GamePhase::Exploration;
            })
            .await?;
        let update = context.read_game(|game| {
            game.combat_update(Some("No enemies remain. Combat is over.".to_owned()))
        });
        info!(
            game_id = context.game_id(),
            round = update.round_number,
            "combat ended automatically"
        );
        let context = self
            .services
            .emit(context, vec![StreamEvent::CombatUpdate(update)])
            .await?;
        Ok(StepResult::continue_with(context))
    }
}

/// Summarises the finished encounter and returns to exploration.
///
/// The summary is skipped when no summarizer agent is registered.
#[derive(Debug, Clone)]
pub struct TransitionToNarrative {
    services: Arc<Services>,
}

impl TransitionToNarrative {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for TransitionToNarrative {
    fn name(&self) -> &str {
        "transition_to_narrative"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let context = if self.services.agents.find(AgentType::Summarizer).is_some() {
            run_agent(
                &self.services,
                context,
                AgentType::Summarizer,
                "Summarize the combat encounter that just ended.",
            )
            .await?
        } else {
            context
        };

        self.services
            .mutate_and_save(&context, |game| {
                if game.phase == GamePhase::Combat {
                    game.phase = GamePhase::Exploration;
                }
            })
            .await?;

        let context = self
            .services
            .emit(
                context,
                vec![StreamEvent::system(
                    "Combat has ended. The story continues.",
                )],
            )
            .await?;
        Ok(StepResult::continue_with(
            context.with_selected_agent(AgentType::Narrative),
        ))
    }
}
