//! Server-sent event stream for one game.

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::{Router, routing::get};
use futures::{Stream, StreamExt};
use taleforge_core::error::DomainError;
use taleforge_core::stream::StreamEvent;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Maps a stream event onto an SSE frame named after the event type.
fn sse_event(event: &StreamEvent) -> Result<Event, axum::Error> {
    let data = event.data().map_err(axum::Error::new)?;
    Event::default()
        .event(event.event_type().as_str())
        .json_data(data)
}

/// GET /{game_id}/events
///
/// Yields `connected` first, then every event published for the game, with
/// heartbeats on idle periods. The stream ends when the broadcaster shuts down.
async fn subscribe(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    if !state.store.contains(&game_id) {
        return Err(DomainError::GameNotFound(game_id).into());
    }

    let subscription = state.broadcaster.subscribe(&game_id);
    info!(game_id = %game_id, subscriber_id = %subscription.id(), "event stream opened");

    let stream = subscription.into_stream().map(|event| {
        sse_event(&event).inspect_err(|err| {
            warn!(error = %err, event = %event.event_type(), "failed to encode event");
        })
    });
    Ok(Sse::new(stream))
}

/// Returns the router for game event streams.
pub fn router() -> Router<AppState> {
    Router::new().route("/{game_id}/events", get(subscribe))
}

