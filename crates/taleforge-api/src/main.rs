//! Taleforge API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use taleforge_api::config::ServerConfig;
use taleforge_api::state::AppState;
use taleforge_api::telemetry;
use taleforge_broadcast::BroadcastService;
use taleforge_core::clock::SystemClock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!(
        delivery = %config.orchestrator.delivery,
        max_combat_iterations = config.orchestrator.max_combat_iterations,
        "Starting Taleforge API server"
    );

    let app_state = AppState::from_config(&config, SystemClock::shared())?;
    let broadcaster = app_state.broadcaster.clone();

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = taleforge_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| format!("invalid HOST:PORT combination: {e}"))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(broadcaster))
        .await?;

    telemetry.shutdown();
    Ok(())
}

/// Waits for Ctrl-C, then closes every subscription so open event streams
/// end and the server can drain.
async fn shutdown_signal(broadcaster: Arc<BroadcastService>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
    broadcaster.shutdown();
}
