//! Transport trait: outbound events to one chat session.

use crate::types::Metadata;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Errors delivering an event to the session.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The session is gone.
    #[error("transport closed")]
    Closed,
}

/// Payload of a `bot-response` event.
///
/// On the wire this is either a bare string (failures) or an object
/// `{ text, metadata? }` (replies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BotResponse {
    /// Generic failure notification.
    Failure(String),
    /// A reply from the assistant.
    Reply {
        /// Text to show.
        text: String,
        /// Structured payload to render alongside the text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Metadata>,
    },
}

impl BotResponse {
    /// A reply carrying text and optional metadata.
    pub fn reply(text: impl Into<String>, metadata: Option<Metadata>) -> Self {
        Self::Reply {
            text: text.into(),
            metadata,
        }
    }
}

/// Outbound half of a chat session.
pub trait Transport: Send + Sync {
    /// Deliver one `bot-response` event.
    fn emit(&self, response: BotResponse) -> impl Future<Output = Result<(), TransportError>> + Send;
}
