//! # Robata server
//!
//! HTTP serving boundary for the [`robata`] batching core, plus the
//! service-registry client that announces an instance to its fleet.
//!
//! The boundary is intentionally thin: it validates input, enqueues one
//! pending request per connection, parks on the completion gate with a hard
//! wait budget, and renders the typed outcome as JSON. Everything
//! interesting happens in the core.

pub mod config;
pub mod registry;

mod handlers;
mod routes;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, RegistryConfig, ServerConfig};
pub use handlers::AppState;
pub use routes::api_routes;

/// Builds the application router over shared state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves until the process exits.
pub async fn start(state: Arc<AppState>, config: &ServerConfig) -> std::io::Result<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app(state)).await
}

/// Binds and serves until `shutdown` resolves.
pub async fn start_with_shutdown<F>(
    state: Arc<AppState>,
    config: &ServerConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
