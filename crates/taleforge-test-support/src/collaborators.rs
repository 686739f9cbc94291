//! Test collaborators: context, metadata, bus, suggester and store doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use taleforge_combat::domain::participant::Participant;
use taleforge_core::error::DomainError;
use taleforge_core::stream::{CombatSuggestionPayload, StreamEvent};
use taleforge_game::ports::{
    AgentType, AllySuggester, BroadcastCommand, ContextProvider, EventBus, GameService,
    MetadataService,
};
use taleforge_game::state::GameState;
use uuid::Uuid;

/// Renders a predictable context string: `"<agent>: <message>"`.
///
/// Enrichment appends `" +enriched"` so tests can tell the two apart.
#[derive(Debug, Default)]
pub struct StaticContextProvider;

impl ContextProvider for StaticContextProvider {
    fn build_context(&self, _game: &GameState, message: &str, agent_type: AgentType) -> String {
        format!("{agent_type}: {message}")
    }

    fn enrich_context(&self, _game: &GameState, _message: &str, context: String) -> String {
        format!("{context} +enriched")
    }
}

/// Reports the same dialogue targets for every message.
#[derive(Debug, Default)]
pub struct StaticMetadataService {
    targets: Vec<String>,
}

impl StaticMetadataService {
    /// Never detects a target.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Always detects `targets`.
    #[must_use]
    pub fn targeting(targets: &[&str]) -> Self {
        Self {
            targets: targets.iter().map(|t| (*t).to_owned()).collect(),
        }
    }
}

impl MetadataService for StaticMetadataService {
    fn detect_dialogue_targets(&self, _game: &GameState, _message: &str) -> Vec<String> {
        self.targets.clone()
    }
}

/// Records every submitted command instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    commands: Mutex<Vec<BroadcastCommand>>,
}

impl RecordingEventBus {
    /// All commands submitted so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn commands(&self) -> Vec<BroadcastCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Every event submitted so far, flattened in submission order.
    pub fn events(&self) -> Vec<StreamEvent> {
        self.commands()
            .into_iter()
            .flat_map(|command| command.events)
            .collect()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn submit_and_wait(&self, commands: Vec<BroadcastCommand>) -> Result<(), DomainError> {
        self.commands.lock().unwrap().extend(commands);
        Ok(())
    }
}

/// Suggests the same action for every ally.
#[derive(Debug)]
pub struct ScriptedSuggester {
    action_text: String,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSuggester {
    /// A suggester that always proposes `action_text`.
    #[must_use]
    pub fn new(action_text: impl Into<String>) -> Self {
        Self {
            action_text: action_text.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Ally ids a suggestion was requested for, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requested_for(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AllySuggester for ScriptedSuggester {
    async fn suggest(
        &self,
        _game: &GameState,
        ally: &Participant,
    ) -> Result<CombatSuggestionPayload, DomainError> {
        self.calls.lock().unwrap().push(ally.entity_id.clone());
        Ok(CombatSuggestionPayload {
            suggestion_id: Uuid::new_v4(),
            npc_id: ally.entity_id.clone(),
            npc_name: ally.name.clone(),
            action_text: self.action_text.clone(),
        })
    }
}

/// A store whose every operation fails with `DomainError::Infrastructure`.
#[derive(Debug, Default)]
pub struct FailingGameService;

#[async_trait]
impl GameService for FailingGameService {
    async fn get_game(&self, _game_id: &str) -> Result<GameState, DomainError> {
        Err(DomainError::Infrastructure(
            "connection refused: store unavailable".to_owned(),
        ))
    }

    async fn save_game(&self, _game: &GameState) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure(
            "connection refused: store unavailable".to_owned(),
        ))
    }

    async fn record_turn(
        &self,
        _game_id: &str,
        _user_message: &str,
        _events: &[StreamEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure(
            "connection refused: store unavailable".to_owned(),
        ))
    }
}
