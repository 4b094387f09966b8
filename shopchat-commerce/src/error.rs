//! Tool host process errors.

/// Failures that stop the tool host process.
#[derive(Debug, thiserror::Error)]
pub enum CommerceError {
    /// The MCP transport failed to start or broke while serving.
    #[error("mcp server error: {0}")]
    Server(String),
}
