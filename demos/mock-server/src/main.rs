mod model;

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use robata::{BatchConfig, BatchInference, PromptTemplate};
use robata_server::{AppState, ServerConfig, registry};

use crate::model::EchoModel;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "robata=info,robata_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let template = PromptTemplate::alpaca();

    let engine = BatchInference::new(EchoModel::new(), template.clone(), BatchConfig::default())?;
    let state = Arc::new(AppState::new(
        Arc::new(engine),
        template,
        config.wait_timeout,
    ));

    // Registration failures at startup are fatal; after that the registry
    // never takes the serving path down.
    let mut registry_handle = match config.registry.clone() {
        Some(registry_config) => Some(registry::init(registry_config).await?),
        None => {
            tracing::info!("no registry configured, serving unregistered");
            None
        }
    };

    robata_server::start_with_shutdown(state, &config, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    })
    .await?;

    if let Some(handle) = registry_handle.as_mut() {
        handle.shutdown();
    }

    Ok(())
}
