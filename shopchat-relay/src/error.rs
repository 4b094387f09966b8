//! Start-up and serving errors for the relay process.

use shopchat_mcp::ConfigError;

/// Failures that stop the relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The tool host configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listener could not bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that failed.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
