//! Conversions from rmcp errors into [`ToolHostError`].
//!
//! Both sides are foreign types here, so these are plain functions rather
//! than `From` impls.

use shopchat_turn::ToolHostError;

/// Handshake or spawn failures.
pub(crate) fn from_init_error(err: impl std::fmt::Display) -> ToolHostError {
    ToolHostError::Connection(err.to_string())
}

/// Request-level failures once the session is up.
pub(crate) fn from_service_error(err: rmcp::ServiceError) -> ToolHostError {
    ToolHostError::Protocol(err.to_string())
}
