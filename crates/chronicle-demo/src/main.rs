//! Chronicle demo entry point.

use chronicle_demo::config::DemoConfig;
use chronicle_demo::error::AppError;
use chronicle_demo::scenario;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = DemoConfig::from_env()?;
    tracing::info!(
        strategy = %config.strategy,
        user_name = %config.user_name,
        "Starting Chronicle demo"
    );

    scenario::run(&config).await?;
    Ok(())
}
