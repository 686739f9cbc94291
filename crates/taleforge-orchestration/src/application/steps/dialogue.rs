//! Direct NPC conversation.

use std::sync::Arc;

use async_trait::async_trait;
use taleforge_core::error::DomainError;
use taleforge_game::ports::AgentType;
use tracing::debug;

use crate::application::services::Services;
use crate::domain::context::OrchestrationContext;
use crate::domain::step::{Step, StepResult};

/// Records which NPCs, if any, the player is addressing.
#[derive(Debug, Clone)]
pub struct DetectDialogueTargets {
    services: Arc<Services>,
}

impl DetectDialogueTargets {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for DetectDialogueTargets {
    fn name(&self) -> &str {
        "detect_dialogue_targets"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let targets = context.read_game(|game| {
            self.services
                .metadata
                .detect_dialogue_targets(game, context.user_message())
        });
        debug!(game_id = context.game_id(), ?targets, "dialogue targets detected");
        let flags = context.flags().clone().with_dialogue_targets(targets);
        Ok(StepResult::continue_with(context.with_flags(flags)))
    }
}

/// Opens a dialogue session with the detected targets.
#[derive(Debug, Clone)]
pub struct BeginDialogue {
    services: Arc<Services>,
}

impl BeginDialogue {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for BeginDialogue {
    fn name(&self) -> &str {
        "begin_dialogue"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let targets = context.flags().dialogue_targets.clone();
        self.services
            .mutate_and_save(&context, |game| game.begin_dialogue(targets))
            .await?;
        Ok(StepResult::continue_with(
            context.with_selected_agent(AgentType::Dialogue),
        ))
    }
}

/// Runs the dialogue agent on the player's message.
#[derive(Debug, Clone)]
pub struct ExecuteDialogueAgent {
    services: Arc<Services>,
}

impl ExecuteDialogueAgent {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for ExecuteDialogueAgent {
    fn name(&self) -> &str {
        "execute_dialogue_agent"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let agent = self.services.agents.get(AgentType::Dialogue)?;
        let context_text = context.read_game(|game| {
            self.services
                .context
                .build_context(game, context.user_message(), AgentType::Dialogue)
        });
        let events = agent
            .process(
                context.user_message(),
                context.game(),
                &context_text,
                self.services.stream(),
            )
            .await?;
        let context = self
            .services
            .emit(context.with_context_text(context_text), events)
            .await?;
        Ok(StepResult::continue_with(context))
    }
}

/// Ends a dialogue session left open by an earlier action.
#[derive(Debug, Clone)]
pub struct CloseStaleDialogue {
    services: Arc<Services>,
}

impl CloseStaleDialogue {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for CloseStaleDialogue {
    fn name(&self) -> &str {
        "close_stale_dialogue"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        if context.read_game(|game| game.dialogue.is_active) {
            debug!(game_id = context.game_id(), "closing stale dialogue");
            self.services
                .mutate_and_save(&context, |game| game.end_dialogue())
                .await?;
        }
        Ok(StepResult::continue_with(context))
    }
}
