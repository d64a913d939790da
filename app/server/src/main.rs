use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

use disaster_qa::{AppConfig, Dataset, Dispatcher};

mod http_server;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber so tracing::info!/debug!/warn!/error! produce output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    let dataset = Dataset::load(&config.data_file)
        .with_context(|| format!("Failed to load dataset from {}", config.data_file.display()))?;
    if dataset.is_empty() {
        tracing::warn!(
            path = %config.data_file.display(),
            "Dataset has no records; structured queries will return not-found"
        );
    }

    let dispatcher = Arc::new(Dispatcher::from_config(&config, Arc::new(dataset))?);
    let app = http_server::router(dispatcher);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("🚀 disaster-qa listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
