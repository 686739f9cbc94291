//! The in-flight state of one pipeline run.
//!
//! An [`OrchestrationContext`] is never mutated in place: every `with_*`
//! method consumes the value and returns its successor. The game itself is
//! held by reference through a [`GameHandle`], so two contexts from the same
//! run observe the same live game until a reload swaps the handle.

use taleforge_core::error::DomainError;
use taleforge_core::stream::StreamEvent;
use taleforge_game::ports::AgentType;
use taleforge_game::state::{GameHandle, GameState};

/// The entity and round a turn prompt was last sent for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMarker {
    /// Prompted participant.
    pub entity_id: String,
    /// Round the prompt was sent in.
    pub round: u32,
}

/// Cross-step signals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestrationFlags {
    /// Whether combat was active when the run started.
    pub combat_was_active: bool,
    /// Whether the inbound message was rewritten as an ally action.
    pub ally_npc_turn: bool,
    /// NPC ids the player is explicitly addressing.
    pub dialogue_targets: Vec<String>,
    /// Last turn prompt sent, for duplicate suppression.
    pub last_prompted: Option<PromptMarker>,
}

impl OrchestrationFlags {
    #[must_use]
    pub fn with_ally_npc_turn(self, ally_npc_turn: bool) -> Self {
        Self {
            ally_npc_turn,
            ..self
        }
    }

    #[must_use]
    pub fn with_dialogue_targets(self, dialogue_targets: Vec<String>) -> Self {
        Self {
            dialogue_targets,
            ..self
        }
    }

    #[must_use]
    pub fn with_last_prompted(self, marker: PromptMarker) -> Self {
        Self {
            last_prompted: Some(marker),
            ..self
        }
    }
}

/// Immutable request state threaded through the steps of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationContext {
    user_message: String,
    game: GameHandle,
    game_id: String,
    selected_agent: Option<AgentType>,
    context_text: Option<String>,
    current_prompt: Option<String>,
    flags: OrchestrationFlags,
    events: Vec<StreamEvent>,
}

impl OrchestrationContext {
    /// Starts a context chain for `user_message` against `game`.
    ///
    /// The game id and whether combat was active are captured now and are
    /// fixed for the rest of the chain.
    #[must_use]
    pub fn new(user_message: impl Into<String>, game: GameHandle) -> Self {
        let (game_id, combat_was_active) = {
            let state = game.read();
            (state.game_id.clone(), state.combat.is_active)
        };
        Self {
            user_message: user_message.into(),
            game,
            game_id,
            selected_agent: None,
            context_text: None,
            current_prompt: None,
            flags: OrchestrationFlags {
                combat_was_active,
                ..OrchestrationFlags::default()
            },
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    /// The live game this context points at.
    #[must_use]
    pub fn game(&self) -> &GameHandle {
        &self.game
    }

    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    #[must_use]
    pub fn selected_agent(&self) -> Option<AgentType> {
        self.selected_agent
    }

    #[must_use]
    pub fn context_text(&self) -> Option<&str> {
        self.context_text.as_deref()
    }

    #[must_use]
    pub fn current_prompt(&self) -> Option<&str> {
        self.current_prompt.as_deref()
    }

    #[must_use]
    pub fn flags(&self) -> &OrchestrationFlags {
        &self.flags
    }

    /// Events accumulated so far, in emission order.
    #[must_use]
    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    /// Consumes the context and returns its events.
    #[must_use]
    pub fn into_events(self) -> Vec<StreamEvent> {
        self.events
    }

    /// Runs `f` against the current game state under a read guard.
    pub fn read_game<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        f(&self.game.read())
    }

    #[must_use]
    pub fn with_user_message(self, user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ..self
        }
    }

    /// Swaps in a freshly loaded game.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StateConsistency` if `game` belongs to a
    /// different game id than this chain.
    pub fn with_game(self, game: GameHandle) -> Result<Self, DomainError> {
        let loaded_id = game.game_id();
        if loaded_id != self.game_id {
            return Err(DomainError::StateConsistency(format!(
                "reload returned game {loaded_id} while orchestrating {}",
                self.game_id
            )));
        }
        Ok(Self { game, ..self })
    }

    #[must_use]
    pub fn with_selected_agent(self, agent_type: AgentType) -> Self {
        Self {
            selected_agent: Some(agent_type),
            ..self
        }
    }

    #[must_use]
    pub fn with_context_text(self, context_text: impl Into<String>) -> Self {
        Self {
            context_text: Some(context_text.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_current_prompt(self, prompt: impl Into<String>) -> Self {
        Self {
            current_prompt: Some(prompt.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_flags(self, flags: OrchestrationFlags) -> Self {
        Self { flags, ..self }
    }

    /// Appends `events` after the ones already accumulated.
    #[must_use]
    pub fn with_events<I>(self, events: I) -> Self
    where
        I: IntoIterator<Item = StreamEvent>,
    {
        let mut accumulated = self.events;
        accumulated.extend(events);
        Self {
            events: accumulated,
            ..self
        }
    }

    #[must_use]
    pub fn with_event(self, event: StreamEvent) -> Self {
        self.with_events([event])
    }
}
