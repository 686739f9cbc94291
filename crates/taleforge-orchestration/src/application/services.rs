//! The collaborators every concrete step may call.

use std::fmt;
use std::sync::Arc;

use taleforge_core::error::DomainError;
use taleforge_core::stream::StreamEvent;
use taleforge_game::ports::{
    AgentRoster, AllySuggester, BroadcastCommand, ContextProvider, EventBus, GameService,
    MetadataService,
};
use taleforge_game::state::GameState;

use crate::application::config::DeliveryMode;
use crate::domain::context::OrchestrationContext;

/// Shared collaborator bundle handed to each step.
#[derive(Clone)]
pub struct Services {
    pub agents: AgentRoster,
    pub context: Arc<dyn ContextProvider>,
    pub metadata: Arc<dyn MetadataService>,
    pub games: Arc<dyn GameService>,
    pub bus: Arc<dyn EventBus>,
    pub suggester: Arc<dyn AllySuggester>,
    pub delivery: DeliveryMode,
}

impl Services {
    /// Records `events` on the context and, when streaming, publishes them
    /// to the game's subscribers before returning.
    ///
    /// # Errors
    ///
    /// Returns any error from the event bus.
    pub async fn emit(
        &self,
        context: OrchestrationContext,
        events: Vec<StreamEvent>,
    ) -> Result<OrchestrationContext, DomainError> {
        if events.is_empty() {
            return Ok(context);
        }
        if self.delivery.is_streaming() {
            self.bus
                .submit_and_wait(vec![BroadcastCommand {
                    topic: context.game_id().to_owned(),
                    events: events.clone(),
                }])
                .await?;
        }
        Ok(context.with_events(events))
    }

    /// Applies `mutate` to the live game, then persists the result.
    ///
    /// The write guard is released before the store is called.
    ///
    /// # Errors
    ///
    /// Returns any error from the game store.
    pub async fn mutate_and_save<F>(
        &self,
        context: &OrchestrationContext,
        mutate: F,
    ) -> Result<(), DomainError>
    where
        F: FnOnce(&mut GameState) + Send,
    {
        let snapshot = {
            let mut game = context.game().write();
            mutate(&mut game);
            game.clone()
        };
        self.games.save_game(&snapshot).await
    }

    /// Whether agents should stream their output.
    #[must_use]
    pub fn stream(&self) -> bool {
        self.delivery.is_streaming()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("agents", &self.agents)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}
