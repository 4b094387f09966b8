#![deny(missing_docs)]
//! Shared vocabulary for the shopchat relay.
//!
//! Provides the transcript and response types that flow through a turn,
//! plus the three collaborator seams the turn resolver drives:
//! [`Provider`] (the model API), [`ToolHost`] (tool discovery and
//! invocation) and [`Transport`] (outbound events to one chat session).

pub mod provider;
pub mod tool_host;
pub mod transport;
pub mod types;

// Re-exports
pub use provider::{Provider, ProviderError};
pub use tool_host::{ToolHost, ToolHostError, ToolOutput};
pub use transport::{BotResponse, Transport, TransportError};
pub use types::*;
