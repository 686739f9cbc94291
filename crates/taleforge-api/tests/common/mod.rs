//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use taleforge_broadcast::{BroadcastConfig, BroadcastService};
use taleforge_game::ports::AgentRoster;
use taleforge_orchestration::application::bus::BroadcastEventBus;
use taleforge_orchestration::application::config::OrchestratorConfig;
use taleforge_orchestration::application::orchestrator::GameOrchestrator;
use taleforge_orchestration::application::services::Services;
use taleforge_store::InMemoryGameStore;
use taleforge_test_support::{
    FixedClock, ScriptedSuggester, StaticContextProvider, StaticMetadataService,
};
use tower::ServiceExt;

use taleforge_api::state::AppState;

/// Application state backed by an in-memory store, a real broadcaster and
/// the given agents, with a deterministic clock.
pub fn test_state(agents: AgentRoster) -> AppState {
    let clock = Arc::new(FixedClock::epoch());
    let store = Arc::new(InMemoryGameStore::new(clock.clone()));
    let broadcaster = Arc::new(BroadcastService::new(BroadcastConfig::default(), clock));
    let config = OrchestratorConfig::default();
    let services = Services {
        agents,
        context: Arc::new(StaticContextProvider),
        metadata: Arc::new(StaticMetadataService::none()),
        games: store.clone(),
        bus: Arc::new(BroadcastEventBus::new(broadcaster.clone())),
        suggester: Arc::new(ScriptedSuggester::new("Bram covers Aria.")),
        delivery: config.delivery,
    };
    let orchestrator = Arc::new(GameOrchestrator::new(services, config));
    AppState::new(store, broadcaster, orchestrator)
}

/// Build the full app router. Uses the same route structure as `main.rs`.
pub fn build_test_app(state: AppState) -> Router {
    taleforge_api::app(state)
}

async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, Some(body)).await
}

/// Send a PUT request with a JSON body and return the response.
pub async fn put_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "PUT", uri, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send_json(app, "GET", uri, None).await
}
