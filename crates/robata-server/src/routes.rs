//! Route definitions.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{AppState, health, inference};

/// API router: the inference endpoint plus a health probe.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/inference", post(inference))
}
