//! Reloading the game from the authoritative store.

use std::sync::Arc;

use async_trait::async_trait;
use taleforge_core::error::DomainError;
use taleforge_game::state::GameHandle;
use tracing::debug;

use crate::application::services::Services;
use crate::domain::context::OrchestrationContext;
use crate::domain::step::{Step, StepResult};

/// Replaces the context's game with a fresh load from the store.
///
/// Must run after anything that may have changed the game out of process
/// and before any guard that reads combat state.
#[derive(Debug, Clone)]
pub struct ReloadState {
    services: Arc<Services>,
}

impl ReloadState {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Step for ReloadState {
    fn name(&self) -> &str {
        "reload_state"
    }

    async fn run(&self, context: OrchestrationContext) -> Result<StepResult, DomainError> {
        let fresh = self.services.games.get_game(context.game_id()).await?;
        debug!(
            game_id = context.game_id(),
            combat_active = fresh.combat.is_active,
            round = fresh.combat.round_number,
            "game reloaded"
        );
        let context = context.with_game(GameHandle::new(fresh))?;
        Ok(StepResult::continue_with(context))
    }
}
