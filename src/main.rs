//! TodoGenius - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the task enhancement API.

use todogenius::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todogenius=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, lm_studio={}",
        config.model_name, config.lm_studio_base_url
    );

    api::serve(config).await
}
