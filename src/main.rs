//! Search Chat - HTTP Server Entry Point
//!
//! Starts the web chat service.

use search_chat::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, max_iterations={}",
        config.llm.model, config.llm.max_iterations
    );
    info!("Starting server on {}:{}", config.host, config.port);

    api::serve(config).await?;

    Ok(())
}
