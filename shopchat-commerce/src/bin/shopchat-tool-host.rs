use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use shopchat_commerce::{CommerceConfig, CommerceServer, StorefrontClient, storefront_registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // stdout carries MCP frames
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CommerceConfig::parse();
    let client = Arc::new(StorefrontClient::new(&config));
    let server = CommerceServer::new(storefront_registry(client));

    tracing::info!(api_url = %config.api_url, "e-commerce MCP server running via stdio");

    match server.serve_stdio().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tool host stopped");
            ExitCode::FAILURE
        }
    }
}
