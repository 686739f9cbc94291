//! Routing the player's message to an agent.

use std::sync::Arc;

use async_trait::async_trait;
use taleforge_core::error::DomainError;
use taleforge_game::ports::AgentType;
use taleforge_game::state::GamePhase;
use tracing::{debug, info};

use crate::application::services::Services;
use crate::domain::ally::ally_action_directive;
use crate::domain::context::OrchestrationContext;
use crate::domain::step::{Step, StepResult};

/// Rewrites the message into an ally directive on an ally's combat turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapAllyAction;

#[async_trait]
impl Step for WrapAllyAction {
    fn name(&self) -> &str {
        "wrap_ally_action"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let directive =
            context.read_game(|game| ally_action_directive(game, context.user_message()))?;
        let ally_turn = directive.is_some();
        let flags = context.flags().clone().with_ally_npc_turn(ally_turn);
        let context = match directive {
            Some(directive) => {
                debug!(game_id = context.game_id(), "message wrapped as ally action");
                context.with_user_message(directive)
            }
            None => context,
        };
        Ok(StepResult::continue_with(context.with_flags(flags)))
    }
}

/// Picks the agent that should act from the game's current mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAgent;

#[async_trait]
impl Step for SelectAgent {
    fn name(&self) -> &str {
        "select_agent"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let agent_type = context.read_game(|game| {
            if game.combat.is_active {
                AgentType::Combat
            } else if game.phase == GamePhase::Dialogue && game.dialogue.is_active {
                AgentType::Dialogue
            } else {
                AgentType::Narrative
            }
        });
        info!(game_id = context.game_id(), agent = %agent_type, "agent selected");
        Ok(StepResult::continue_with(
            context.with_selected_agent(agent_type),
        ))
    }
}

fn selected_agent(context: &OrchestrationContext) -> Result<AgentType, DomainError> {
    context.selected_agent().ok_or_else(|| {
        DomainError::StateConsistency("no agent selected before agent execution".to_owned())
    })
}

/// Builds the base context text for the selected agent.
#[derive(Debug, Clone)]
pub struct BuildContext {
    services: Arc<Services>,
}

impl BuildContext {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for BuildContext {
    fn name(&self) -> &str {
        "build_context"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let agent_type = selected_agent(&context)?;
        let text = context.read_game(|game| {
            self.services
                .context
                .build_context(game, context.user_message(), agent_type)
        });
        Ok(StepResult::continue_with(context.with_context_text(text)))
    }
}

/// Adds details about entities mentioned in the message.
#[derive(Debug, Clone)]
pub struct EnrichContext {
    services: Arc<Services>,
}

impl EnrichContext {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for EnrichContext {
    fn name(&self) -> &str {
        "enrich_context"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let base = context.context_text().unwrap_or_default().to_owned();
        let enriched = context.read_game(|game| {
            self.services
                .context
                .enrich_context(game, context.user_message(), base)
        });
        Ok(StepResult::continue_with(context.with_context_text(enriched)))
    }
}

/// Runs the selected agent and emits its events.
#[derive(Debug, Clone)]
pub struct ExecuteAgent {
    services: Arc<Services>,
}

impl ExecuteAgent {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for ExecuteAgent {
    fn name(&self) -> &str {
        "execute_agent"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let agent_type = selected_agent(&context)?;
        let agent = self.services.agents.get(agent_type)?;
        let events = agent
            .process(
                context.user_message(),
                context.game(),
                context.context_text().unwrap_or_default(),
                self.services.stream(),
            )
            .await?;
        debug!(
            game_id = context.game_id(),
            agent = %agent_type,
            events = events.len(),
            "agent finished"
        );
        let context = self.services.emit(context, events).await?;
        Ok(StepResult::continue_with(context))
    }
}
