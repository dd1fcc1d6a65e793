use anyhow::Result;
use catalog_site::{config::Config, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("catalog_site=info".parse()?),
        )
        .init();

    info!("Starting catalog site server");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Serving {} ({} mode)",
        config.site_base_url, config.app_env
    );

    server::run(config).await
}
