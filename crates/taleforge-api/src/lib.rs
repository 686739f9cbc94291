//! Taleforge API: HTTP surface for the game orchestration engine.
//!
//! Players seed games, submit actions and subscribe to a per-game server-sent
//! event stream. Agents run in an external service reached over HTTP.

use axum::Router;

pub mod agents;
pub mod config;
pub mod context;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use crate::state::AppState;

/// Builds the application router. Middleware layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/games", routes::games::router())
        .nest("/api/v1/games", routes::events::router())
        .with_state(state)
}
