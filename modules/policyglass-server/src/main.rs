use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use policyglass_common::Config;
use policyglass_core::Deps;

mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting policyglass-server");

    let config = Config::from_env();
    config.log_summary();

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let deps = Arc::new(Deps::new(http_client, config));

    let app = routes::build_router(deps);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
