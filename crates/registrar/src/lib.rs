//! Block registrar: the authenticated side channel that writes block entries.
//!
//! A deliberately minimal privileged endpoint — one POST route guarded by a
//! shared bearer token, plus health and metrics for operators. It never
//! deletes or renews entries; the store's TTL expiry owns entry lifetime.

pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use state::{AppState, SharedState};

/// Build the Axum router with the webhook and operator routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Block-list webhook
        .route("/rt-block", post(routes::block::register_block))
        // Operator endpoints
        .route("/api/health", get(routes::health::health_check))
        .route("/api/metrics", get(routes::metrics::get_metrics))
        .with_state(state)
        .layer(cors)
}

/// Start the registrar server on the specified address.
///
/// This function will block until the server is shut down.
pub async fn run_registrar_server(state: SharedState, listen_addr: &str) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("registrar listening on {}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Convenience function to create a SharedState.
pub fn new_shared_state(
    config: &rtgate_common::RegistrarConfig,
    store: rtgate_store::SharedStore,
    registry: prometheus::Registry,
) -> SharedState {
    Arc::new(AppState::new(config, store, registry))
}
