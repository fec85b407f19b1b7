//! Route definitions

use axum::{routing::get, Router};

use crate::handlers::health;
use crate::server::AppState;

/// Create the status router
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
