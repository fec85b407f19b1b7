//! HTTP status server
//!
//! Starts and manages the axum-based status endpoint.

use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use kiosk_core::{Config, SessionHealth};

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub health: SessionHealth,
}

/// Start the status server. Runs until the process exits.
pub async fn start_server(port: u16, config: Config, health: SessionHealth) -> anyhow::Result<()> {
    let state = AppState { config, health };

    let app = Router::new()
        .merge(routes())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("health endpoint listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
