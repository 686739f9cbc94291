//! Shared harness for orchestration integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use taleforge_game::ports::{Agent, AgentRoster, AgentType, GameService};
use taleforge_game::state::{GamePhase, GameState};
use taleforge_orchestration::application::config::{DeliveryMode, OrchestratorConfig};
use taleforge_orchestration::application::orchestrator::GameOrchestrator;
use taleforge_orchestration::application::services::Services;
use taleforge_store::InMemoryGameStore;
use taleforge_test_support::fixtures::{self, GAME_ID};
use taleforge_test_support::{
    FixedClock, RecordingEventBus, ScriptedSuggester, StaticContextProvider,
    StaticMetadataService,
};

pub const SUGGESTION: &str = "Bram raises his shield and covers Aria.";

/// An in-memory store, a recording bus and a configurable agent roster.
pub struct Harness {
    pub store: Arc<InMemoryGameStore>,
    pub bus: Arc<RecordingEventBus>,
    pub suggester: Arc<ScriptedSuggester>,
    roster: AgentRoster,
    metadata: Arc<StaticMetadataService>,
}

impl Harness {
    pub fn new(game: GameState) -> Self {
        let store = Arc::new(InMemoryGameStore::new(Arc::new(FixedClock::epoch())));
        store.put(game);
        Self {
            store,
            bus: Arc::new(RecordingEventBus::default()),
            suggester: Arc::new(ScriptedSuggester::new(SUGGESTION)),
            roster: AgentRoster::new(),
            metadata: Arc::new(StaticMetadataService::none()),
        }
    }

    pub fn games(&self) -> Arc<dyn GameService> {
        Arc::clone(&self.store) as Arc<dyn GameService>
    }

    pub fn with_agent(mut self, agent_type: AgentType, agent: Arc<dyn Agent>) -> Self {
        self.roster = self.roster.with(agent_type, agent);
        self
    }

    pub fn with_dialogue_targets(mut self, targets: &[&str]) -> Self {
        self.metadata = Arc::new(StaticMetadataService::targeting(targets));
        self
    }

    pub fn services(&self) -> Services {
        Services {
            agents: self.roster.clone(),
            context: Arc::new(StaticContextProvider),
            metadata: Arc::clone(&self.metadata) as _,
            games: self.games(),
            bus: Arc::clone(&self.bus) as _,
            suggester: Arc::clone(&self.suggester) as _,
            delivery: DeliveryMode::Streaming,
        }
    }

    pub fn orchestrator(&self, config: OrchestratorConfig) -> GameOrchestrator {
        GameOrchestrator::new(self.services(), config)
    }

    pub fn streaming(&self) -> GameOrchestrator {
        self.orchestrator(OrchestratorConfig::default())
    }

    pub fn buffered(&self) -> GameOrchestrator {
        self.orchestrator(OrchestratorConfig {
            delivery: DeliveryMode::Buffered,
            ..OrchestratorConfig::default()
        })
    }

    pub async fn stored(&self) -> GameState {
        self.games().get_game(GAME_ID).await.unwrap()
    }
}

/// A mutation that starts combat with participants in exactly `order`.
pub fn start_combat(order: &'static [&'static str]) -> impl Fn(&mut GameState) + Send + Sync {
    move |game: &mut GameState| {
        let fight = fixtures::game_in_combat(order);
        game.combat = fight.combat;
        game.phase = GamePhase::Combat;
    }
}
