//! Agents backed by the external agent service.
//!
//! The service exposes one endpoint per agent role. An agent reply carries
//! the events to stream and, when its tool calls changed the game, the
//! updated state; that state is written to the authoritative store before the
//! reply is returned so the pipeline's reload sees it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taleforge_combat::domain::participant::Participant;
use taleforge_core::error::DomainError;
use taleforge_core::stream::{CombatSuggestionPayload, StreamEvent};
use taleforge_game::ports::{Agent, AgentRoster, AgentType, AllySuggester, GameService};
use taleforge_game::state::{GameHandle, GameState};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    message: &'a str,
    context: &'a str,
    stream: bool,
    game: &'a GameState,
}

/// What the agent service returns for one call.
#[derive(Debug, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub events: Vec<StreamEvent>,
    /// Set when the agent's tool calls changed the game.
    #[serde(default)]
    pub game: Option<GameState>,
}

/// One agent role served by the external agent service.
#[derive(Clone)]
pub struct RemoteAgent {
    client: reqwest::Client,
    endpoint: String,
    agent_type: AgentType,
    games: Arc<dyn GameService>,
}

impl RemoteAgent {
    /// An agent posting to `{base_url}/agents/{agent_type}`.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        agent_type: AgentType,
        games: Arc<dyn GameService>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/agents/{agent_type}", base_url.trim_end_matches('/')),
            agent_type,
            games,
        }
    }

    /// A roster with every agent role served by `base_url`.
    #[must_use]
    pub fn roster(
        client: &reqwest::Client,
        base_url: &str,
        games: &Arc<dyn GameService>,
    ) -> AgentRoster {
        [
            AgentType::Narrative,
            AgentType::Combat,
            AgentType::Dialogue,
            AgentType::Summarizer,
        ]
        .into_iter()
        .fold(AgentRoster::new(), |roster, agent_type| {
            let agent = Self::new(client.clone(), base_url, agent_type, Arc::clone(games));
            roster.with(agent_type, Arc::new(agent))
        })
    }
}

impl std::fmt::Debug for RemoteAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteAgent")
            .field("endpoint", &self.endpoint)
            .field("agent_type", &self.agent_type)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Agent for RemoteAgent {
    #[instrument(skip_all, fields(agent = %self.agent_type))]
    async fn process(
        &self,
        message: &str,
        game: &GameHandle,
        context_text: &str,
        stream: bool,
    ) -> Result<Vec<StreamEvent>, DomainError> {
        let snapshot = game.snapshot();
        let request = AgentRequest {
            message,
            context: context_text,
            stream,
            game: &snapshot,
        };
        let reply: AgentReply = post_json(&self.client, &self.endpoint, &request)
            .await
            .map_err(|e| DomainError::Agent(format!("{} agent: {e}", self.agent_type)))?;

        if let Some(updated) = reply.game {
            if updated.game_id != snapshot.game_id {
                return Err(DomainError::Agent(format!(
                    "{} agent returned game {} for game {}",
                    self.agent_type, updated.game_id, snapshot.game_id
                )));
            }
            self.games.save_game(&updated).await?;
            debug!(game_id = %updated.game_id, "agent updated the game");
        }
        Ok(reply.events)
    }
}

#[derive(Debug, Serialize)]
struct SuggestionRequest<'a> {
    game: &'a GameState,
    ally: &'a Participant,
}

#[derive(Debug, Deserialize)]
struct SuggestionReply {
    action_text: String,
}

/// Ally suggestions from `{base_url}/agents/ally-suggestions`.
#[derive(Debug, Clone)]
pub struct RemoteAllySuggester {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteAllySuggester {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/agents/ally-suggestions", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl AllySuggester for RemoteAllySuggester {
    async fn suggest(
        &self,
        game: &GameState,
        ally: &Participant,
    ) -> Result<CombatSuggestionPayload, DomainError> {
        let reply: SuggestionReply =
            post_json(&self.client, &self.endpoint, &SuggestionRequest { game, ally })
                .await
                .map_err(|e| DomainError::Agent(format!("ally suggestion: {e}")))?;
        Ok(CombatSuggestionPayload {
            suggestion_id: Uuid::new_v4(),
            npc_id: ally.entity_id.clone(),
            npc_name: ally.name.clone(),
            action_text: reply.action_text,
        })
    }
}

async fn post_json<B, R>(client: &reqwest::Client, url: &str, body: &B) -> Result<R, String>
where
    B: Serialize + ?Sized,
    R: serde::de::DeserializeOwned,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(format!("service returned {status}: {error_body}"));
    }

    response
        .json()
        .await
        .map_err(|e| format!("response parse failed: {e}"))
}
