//! Statement extraction server binary
//!
//! Run with: cargo run -p statement-extract --bin statement-extract-server

use statement_extract::{config::ExtractConfig, server::ExtractServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statement_extract=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ExtractConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Model: {}", config.gemini.model);
    tracing::info!("  - Poll interval: {}s", config.polling.interval_secs);
    tracing::info!("  - Upload directory: {}", config.storage.upload_dir.display());
    tracing::info!("  - Allowed origins: {}", config.server.allowed_origins.join(", "));

    let server = ExtractServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  GET  /         - Authenticated liveness check");
    println!("  POST /execute  - Extract transactions from a PDF statement");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
