//! Shared application state.

use std::sync::Arc;

use taleforge_broadcast::BroadcastService;
use taleforge_core::clock::SharedClock;
use taleforge_game::ports::GameService;
use taleforge_orchestration::application::bus::BroadcastEventBus;
use taleforge_orchestration::application::orchestrator::GameOrchestrator;
use taleforge_orchestration::application::services::Services;
use taleforge_store::InMemoryGameStore;

use crate::agents::{RemoteAgent, RemoteAllySuggester};
use crate::config::ServerConfig;
use crate::context::{AddressedNpcDetector, RosterContextProvider};
use crate::error::AppError;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Authoritative game store.
    pub store: Arc<InMemoryGameStore>,
    /// Per-game event fan-out.
    pub broadcaster: Arc<BroadcastService>,
    /// Runs the turn pipeline for player actions.
    pub orchestrator: Arc<GameOrchestrator>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        store: Arc<InMemoryGameStore>,
        broadcaster: Arc<BroadcastService>,
        orchestrator: Arc<GameOrchestrator>,
    ) -> Self {
        Self {
            store,
            broadcaster,
            orchestrator,
        }
    }

    /// Wires the production collaborators described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AgentClient` if the HTTP client cannot be built.
    pub fn from_config(config: &ServerConfig, clock: SharedClock) -> Result<Self, AppError> {
        let store = Arc::new(
            InMemoryGameStore::new(Arc::clone(&clock)).with_history_limit(config.history_limit),
        );
        let games: Arc<dyn GameService> = Arc::clone(&store) as Arc<dyn GameService>;
        let broadcaster = Arc::new(BroadcastService::new(config.broadcast, clock));
        let client = reqwest::Client::builder().build()?;

        let services = Services {
            agents: RemoteAgent::roster(&client, &config.agent_service_url, &games),
            context: Arc::new(RosterContextProvider),
            metadata: Arc::new(AddressedNpcDetector),
            games,
            bus: Arc::new(BroadcastEventBus::new(Arc::clone(&broadcaster))),
            suggester: Arc::new(RemoteAllySuggester::new(client, &config.agent_service_url)),
            delivery: config.orchestrator.delivery,
        };
        let orchestrator = Arc::new(GameOrchestrator::new(services, config.orchestrator));
        Ok(Self::new(store, broadcaster, orchestrator))
    }
}
