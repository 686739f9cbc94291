//! Routes for seeding games and submitting player actions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use taleforge_core::error::DomainError;
use taleforge_core::rng::SystemRng;
use taleforge_core::stream::StreamEvent;
use taleforge_game::ports::GameService;
use taleforge_game::state::GameState;
use taleforge_store::TurnRecord;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{game_id}/actions.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    /// What the player says or does.
    pub message: String,
}

/// Request body for POST /{game_id}/combat.
#[derive(Debug, Deserialize)]
pub struct StartCombatRequest {
    /// Roster ids of everyone joining the fight.
    pub participants: Vec<String>,
}

/// Response body for a processed action.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// Events emitted while processing the action, in order.
    pub events: Vec<StreamEvent>,
    /// Whether the turn pipeline stopped early.
    pub halted: bool,
    /// Why it stopped.
    pub reason: Option<String>,
}

/// PUT /{game_id}
#[instrument(skip(state, game))]
async fn put_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(game): Json<GameState>,
) -> Result<(StatusCode, Json<GameState>), ApiError> {
    if game.game_id != game_id {
        return Err(DomainError::Validation(format!(
            "body game_id {} does not match path {game_id}",
            game.game_id
        ))
        .into());
    }

    let replaced = state.store.put(game.clone());
    info!(replaced, "game seeded");

    let status = if replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(game)))
}

/// GET /{game_id}
async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameState>, ApiError> {
    let game = state.store.get_game(&game_id).await?;
    Ok(Json(game))
}

/// GET /{game_id}/history
async fn get_history(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<TurnRecord>>, ApiError> {
    if !state.store.contains(&game_id) {
        return Err(DomainError::GameNotFound(game_id).into());
    }
    Ok(Json(state.store.history(&game_id)))
}

/// POST /{game_id}/actions
#[instrument(skip(state, request))]
async fn submit_action(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(DomainError::Validation("message must not be empty".to_owned()).into());
    }

    let outcome = state
        .orchestrator
        .process_user_action(&game_id, message)
        .await?;

    Ok(Json(ActionResponse {
        events: outcome.events,
        halted: outcome.halted,
        reason: outcome.reason,
    }))
}

/// POST /{game_id}/combat
///
/// Rolls initiative for the listed roster entities and moves the game into
/// the combat phase.
#[instrument(skip(state, request))]
async fn start_combat(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<StartCombatRequest>,
) -> Result<Json<GameState>, ApiError> {
    if request.participants.is_empty() {
        return Err(DomainError::Validation("participants must not be empty".to_owned()).into());
    }

    let ids: Vec<&str> = request.participants.iter().map(String::as_str).collect();
    let game = state.store.update(&game_id, |game| {
        if game.combat.is_active {
            return Err(DomainError::Validation("combat is already active".to_owned()));
        }
        game.start_combat(&ids, &mut SystemRng::from_entropy())?;
        Ok(game.clone())
    })??;

    info!(participants = ids.len(), "combat started");
    Ok(Json(game))
}

/// Returns the router for game resources.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{game_id}", get(get_game).put(put_game))
        .route("/{game_id}/history", get(get_history))
        .route("/{game_id}/actions", post(submit_action))
        .route("/{game_id}/combat", post(start_combat))
}
