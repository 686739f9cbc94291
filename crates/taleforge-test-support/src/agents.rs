//! Test agents: scripted `Agent` implementations.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taleforge_core::error::DomainError;
use taleforge_core::stream::StreamEvent;
use taleforge_game::ports::{Agent, GameService};
use taleforge_game::state::{GameHandle, GameState};

/// One recorded `Agent::process` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCall {
    /// The message the agent received.
    pub message: String,
    /// The context text the agent received.
    pub context_text: String,
    /// Whether streaming was requested.
    pub stream: bool,
}

#[derive(Debug, Default)]
struct CallLog(Mutex<Vec<AgentCall>>);

impl CallLog {
    fn record(&self, message: &str, context_text: &str, stream: bool) {
        self.0.lock().unwrap().push(AgentCall {
            message: message.to_owned(),
            context_text: context_text.to_owned(),
            stream,
        });
    }

    fn snapshot(&self) -> Vec<AgentCall> {
        self.0.lock().unwrap().clone()
    }
}

/// An agent that replays scripted responses and records every call.
///
/// Scripted responses are returned in order; once exhausted, every further
/// call returns the fallback response.
#[derive(Debug)]
pub struct ScriptedAgent {
    script: Mutex<VecDeque<Vec<StreamEvent>>>,
    fallback: Vec<StreamEvent>,
    calls: CallLog,
}

impl ScriptedAgent {
    /// An agent that returns `events` on every call.
    #[must_use]
    pub fn replying(events: Vec<StreamEvent>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: events,
            calls: CallLog::default(),
        }
    }

    /// An agent that returns each scripted response once, then nothing.
    #[must_use]
    pub fn with_script(responses: Vec<Vec<StreamEvent>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fallback: Vec::new(),
            calls: CallLog::default(),
        }
    }

    /// All calls received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<AgentCall> {
        self.calls.snapshot()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn process(
        &self,
        message: &str,
        _game: &GameHandle,
        context_text: &str,
        stream: bool,
    ) -> Result<Vec<StreamEvent>, DomainError> {
        self.calls.record(message, context_text, stream);
        let scripted = self.script.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| self.fallback.clone()))
    }
}

/// An agent that always fails with `DomainError::Agent`.
#[derive(Debug, Default)]
pub struct FailingAgent {
    calls: CallLog,
}

impl FailingAgent {
    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.snapshot().len()
    }
}

#[async_trait]
impl Agent for FailingAgent {
    async fn process(
        &self,
        message: &str,
        _game: &GameHandle,
        context_text: &str,
        stream: bool,
    ) -> Result<Vec<StreamEvent>, DomainError> {
        self.calls.record(message, context_text, stream);
        Err(DomainError::Agent("model backend timed out".to_owned()))
    }
}

type Mutation = dyn Fn(&mut GameState) + Send + Sync;

/// An agent whose "tool calls" mutate the authoritative store.
///
/// Each call loads the game from the store, applies the mutation, saves it,
/// and returns the configured events, mimicking out-of-process side effects.
pub struct MutatingAgent {
    store: Arc<dyn GameService>,
    events: Vec<StreamEvent>,
    mutate: Box<Mutation>,
    calls: CallLog,
}

impl MutatingAgent {
    /// An agent that applies `mutate` to the stored game on every call.
    pub fn new<F>(store: Arc<dyn GameService>, events: Vec<StreamEvent>, mutate: F) -> Self
    where
        F: Fn(&mut GameState) + Send + Sync + 'static,
    {
        Self {
            store,
            events,
            mutate: Box::new(mutate),
            calls: CallLog::default(),
        }
    }

    /// An agent that advances the combat turn on every call.
    pub fn advancing_turn(store: Arc<dyn GameService>, events: Vec<StreamEvent>) -> Self {
        Self::new(store, events, |game| {
            game.combat.next_turn();
        })
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<AgentCall> {
        self.calls.snapshot()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

impl std::fmt::Debug for MutatingAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutatingAgent")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Agent for MutatingAgent {
    async fn process(
        &self,
        message: &str,
        game: &GameHandle,
        context_text: &str,
        stream: bool,
    ) -> Result<Vec<StreamEvent>, DomainError> {
        self.calls.record(message, context_text, stream);
        let game_id = game.game_id();
        let mut stored = self.store.get_game(&game_id).await?;
        (self.mutate)(&mut stored);
        self.store.save_game(&stored).await?;
        Ok(self.events.clone())
    }
}
