//! Collaborator interfaces consumed by the orchestration layer.
//!
//! Concrete agents, context construction, persistence and delivery live
//! outside the coordination core; they are reached only through these traits.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taleforge_combat::domain::participant::Participant;
use taleforge_core::error::DomainError;
use taleforge_core::stream::{CombatSuggestionPayload, StreamEvent};

use crate::state::{GameHandle, GameState};

/// The specialised agents a message can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Exploration and story narration.
    Narrative,
    /// Combat resolution.
    Combat,
    /// NPC conversation.
    Dialogue,
    /// End-of-combat recap.
    Summarizer,
}

impl AgentType {
    /// Stable lowercase name, used in URLs and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::Combat => "combat",
            Self::Dialogue => "dialogue",
            Self::Summarizer => "summarizer",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque agent that turns a message into stream events.
///
/// Agents may mutate the authoritative game store through tool calls; the
/// orchestration layer reloads state after every agent call.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Processes `message` against the live game.
    async fn process(
        &self,
        message: &str,
        game: &GameHandle,
        context_text: &str,
        stream: bool,
    ) -> Result<Vec<StreamEvent>, DomainError>;
}

/// Agents keyed by the role they play.
#[derive(Clone, Default)]
pub struct AgentRoster {
    agents: HashMap<AgentType, Arc<dyn Agent>>,
}

impl AgentRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `agent` for `agent_type`, replacing any previous entry.
    #[must_use]
    pub fn with(mut self, agent_type: AgentType, agent: Arc<dyn Agent>) -> Self {
        self.agents.insert(agent_type, agent);
        self
    }

    /// Returns the agent registered for `agent_type`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Agent` if no agent is registered.
    pub fn get(&self, agent_type: AgentType) -> Result<Arc<dyn Agent>, DomainError> {
        self.find(agent_type)
            .ok_or_else(|| DomainError::Agent(format!("no {agent_type} agent registered")))
    }

    /// Returns the agent registered for `agent_type`, if any.
    #[must_use]
    pub fn find(&self, agent_type: AgentType) -> Option<Arc<dyn Agent>> {
        self.agents.get(&agent_type).cloned()
    }
}

impl fmt::Debug for AgentRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRoster")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds the text context handed to an agent.
pub trait ContextProvider: Send + Sync {
    /// Builds the base context for `agent_type`.
    fn build_context(&self, game: &GameState, message: &str, agent_type: AgentType) -> String;

    /// Adds entity details mentioned in `message`. Identity by default.
    fn enrich_context(&self, _game: &GameState, _message: &str, context: String) -> String {
        context
    }
}

/// Extracts structured metadata from player messages.
pub trait MetadataService: Send + Sync {
    /// Returns the ids of NPCs the player is explicitly addressing.
    fn detect_dialogue_targets(&self, game: &GameState, message: &str) -> Vec<String>;
}

/// The authoritative game store.
#[async_trait]
pub trait GameService: Send + Sync {
    /// Loads the current state. Must fail loudly rather than return stale data.
    async fn get_game(&self, game_id: &str) -> Result<GameState, DomainError>;

    /// Persists `game`. Games that were never seeded are `GameNotFound`.
    async fn save_game(&self, game: &GameState) -> Result<(), DomainError>;

    /// Appends one processed player action to the conversation history.
    async fn record_turn(
        &self,
        game_id: &str,
        user_message: &str,
        events: &[StreamEvent],
    ) -> Result<(), DomainError>;
}

/// Request to deliver events to every subscriber of `topic`.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastCommand {
    /// Broadcast topic (the game id).
    pub topic: String,
    /// Events to deliver, in order.
    pub events: Vec<StreamEvent>,
}

/// Command dispatch with a synchronous-looking façade.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Dispatches `commands` and waits until each has been handled.
    async fn submit_and_wait(&self, commands: Vec<BroadcastCommand>) -> Result<(), DomainError>;
}

/// Proposes actions for allied NPCs during combat.
#[async_trait]
pub trait AllySuggester: Send + Sync {
    /// Suggests an action for `ally` given the current game.
    async fn suggest(
        &self,
        game: &GameState,
        ally: &Participant,
    ) -> Result<CombatSuggestionPayload, DomainError>;
}
