//! Tool host trait: tool discovery and invocation.

use crate::types::{ToolDescriptor, TranscriptBlock};
use std::future::Future;
use thiserror::Error;

/// Errors from the tool host itself.
///
/// A tool that runs and fails is NOT an error here: tool failures come back
/// as ordinary [`ToolOutput`] text so the model can talk about them. These
/// variants cover the host being unreachable or speaking nonsense.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolHostError {
    /// Could not start or reach the tool host.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The host answered with a protocol-level error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The named tool is not offered by the host.
    #[error("tool not found: {0}")]
    NotFound(String),
}

/// Result payload of one tool invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolOutput {
    /// Content blocks; metadata, if any, rides on the first block.
    pub content: Vec<TranscriptBlock>,
}

impl ToolOutput {
    /// A single plain-text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TranscriptBlock::text(text)],
        }
    }
}

/// Tool host interface.
///
/// Scoped to one turn: the caller acquires a host before resolving and
/// releases it afterwards, whatever the outcome.
pub trait ToolHost: Send + Sync {
    /// List every tool the host offers.
    fn list_tools(
        &self,
    ) -> impl Future<Output = Result<Vec<ToolDescriptor>, ToolHostError>> + Send;

    /// Invoke a tool by name with JSON arguments.
    fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> impl Future<Output = Result<ToolOutput, ToolHostError>> + Send;
}
