#![deny(missing_docs)]
//! Chat relay for the shopchat storefront assistant.
//!
//! Browsers connect to [`SOCKET_PATH`](server::SOCKET_PATH) and send
//! `user-message` frames. Each message becomes one turn: a fresh MCP tool
//! host, a [`TurnResolver`](shopchat_resolver::TurnResolver) run against
//! Anthropic, and `bot-response` frames back on the same socket.

pub mod config;
pub mod envelope;
pub mod error;
pub mod server;
pub mod session;

use std::sync::Arc;

pub use config::RelayConfig;
pub use envelope::{ClientEvent, ServerEvent, UserMessage};
pub use error::RelayError;
pub use server::router;
pub use session::{
    FAILURE_MESSAGE, McpConnector, SessionTransport, ToolHostConnector, TurnHandler,
};

use shopchat_resolver::TurnResolver;

/// Bind and serve until Ctrl-C.
///
/// # Errors
///
/// Returns [`RelayError`] if the tool host config is invalid, the listener
/// cannot bind, or the server fails.
pub async fn serve(config: RelayConfig) -> Result<(), RelayError> {
    let command = config.tool_host_command()?;
    let resolver = TurnResolver::new(config.provider(), config.resolver_config());
    let handler = Arc::new(TurnHandler::new(resolver, McpConnector::new(command)));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(addr = %addr, "socket server running");

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(RelayError::Serve)
}
