//! Per-message turn handling.
//!
//! Each inbound `user-message` gets a fresh tool host, one resolver run and
//! exactly one of: the resolver's replies, or a single failure event. The
//! tool host is released whichever way the turn ends.

use std::future::Future;

use shopchat_mcp::{McpToolHost, ToolHostCommand};
use shopchat_resolver::{TurnError, TurnOutcome, TurnResolver};
use shopchat_turn::{
    BotResponse, Provider, ToolHost, ToolHostError, Transport, TransportError, TranscriptEntry,
};
use tokio::sync::mpsc;

use crate::envelope::{ServerEvent, UserMessage};

/// Text of the single event sent when a turn fails.
pub const FAILURE_MESSAGE: &str = "❌ Error processing your request.";

/// [`Transport`] feeding one socket's writer task.
#[derive(Debug, Clone)]
pub struct SessionTransport {
    tx: mpsc::Sender<ServerEvent>,
}

impl SessionTransport {
    /// Wrap the sending half of the socket's outbound queue.
    pub fn new(tx: mpsc::Sender<ServerEvent>) -> Self {
        Self { tx }
    }
}

impl Transport for SessionTransport {
    fn emit(
        &self,
        response: BotResponse,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        async move {
            self.tx
                .send(ServerEvent::BotResponse(response))
                .await
                .map_err(|_| TransportError::Closed)
        }
    }
}

/// Acquires and releases a tool host for one turn.
pub trait ToolHostConnector: Send + Sync {
    /// The host handed to the resolver.
    type Host: ToolHost;

    /// Start a host.
    fn connect(&self) -> impl Future<Output = Result<Self::Host, ToolHostError>> + Send;

    /// Shut a host down. Failures are logged, not returned.
    fn release(&self, host: Self::Host) -> impl Future<Output = ()> + Send;
}

/// Spawns the MCP tool host process for each turn.
#[derive(Debug, Clone)]
pub struct McpConnector {
    command: ToolHostCommand,
}

impl McpConnector {
    /// Use this command for every turn.
    pub fn new(command: ToolHostCommand) -> Self {
        Self { command }
    }
}

impl ToolHostConnector for McpConnector {
    type Host = McpToolHost;

    fn connect(&self) -> impl Future<Output = Result<McpToolHost, ToolHostError>> + Send {
        McpToolHost::connect_stdio(&self.command)
    }

    fn release(&self, host: McpToolHost) -> impl Future<Output = ()> + Send {
        async move {
            if let Err(e) = host.close().await {
                tracing::warn!(error = %e, "tool host did not shut down cleanly");
            }
        }
    }
}

/// Shared per-process turn machinery.
pub struct TurnHandler<P: Provider, C: ToolHostConnector> {
    resolver: TurnResolver<P>,
    connector: C,
}

impl<P: Provider, C: ToolHostConnector> TurnHandler<P, C> {
    /// Combine a resolver with a tool host source.
    pub fn new(resolver: TurnResolver<P>, connector: C) -> Self {
        Self {
            resolver,
            connector,
        }
    }

    /// The resolver driving each turn.
    pub fn resolver(&self) -> &TurnResolver<P> {
        &self.resolver
    }

    /// The tool host source.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Handle one user message end to end.
    ///
    /// On failure the error is logged and exactly one [`FAILURE_MESSAGE`]
    /// event goes to `transport`. Returns the outcome on success.
    pub async fn handle<T: Transport>(
        &self,
        message: UserMessage,
        transport: &T,
    ) -> Option<TurnOutcome> {
        match self.run(message, transport).await {
            Ok(outcome) => {
                tracing::info!(
                    model_calls = outcome.model_calls,
                    tool_calls = outcome.tool_calls,
                    replies = outcome.replies,
                    "turn complete"
                );
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                if let Err(e) = transport
                    .emit(BotResponse::Failure(FAILURE_MESSAGE.into()))
                    .await
                {
                    tracing::warn!(error = %e, "could not deliver failure notice");
                }
                None
            }
        }
    }

    async fn run<T: Transport>(
        &self,
        message: UserMessage,
        transport: &T,
    ) -> Result<TurnOutcome, TurnError> {
        let host = self.connector.connect().await?;

        let mut transcript = message.context;
        transcript.push(TranscriptEntry::user(message.query));

        let result = self.resolver.run_turn(transcript, &host, transport).await;
        self.connector.release(host).await;
        result
    }
}
