use estate_hub::config::AppConfig;
use estate_hub::server::{self, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🏠 Estate Hub");

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(config).await?;

    server::serve(state).await
}
