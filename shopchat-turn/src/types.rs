//! Transcript and model-response types.
//!
//! These are the lingua franca of a turn. The relay deserialises browser
//! context into them, providers convert them to and from their wire
//! formats, and the resolver mutates the transcript as the turn advances.

use serde::{Deserialize, Serialize};

/// Out-of-band structured payload (e.g. product listings) attached to a
/// message. Surfaced to the chat UI, never sent to the model.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// An ordered conversation.
pub type Transcript = Vec<TranscriptEntry>;

/// Role of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End user, or a tool result relayed on the user's behalf.
    User,
    /// Assistant (model) reply.
    Assistant,
}

/// A single block inside a block-list message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptBlock {
    /// Plain text, optionally annotated with metadata.
    Text {
        /// The text content.
        text: String,
        /// Structured payload riding along with the text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Metadata>,
    },
}

impl TranscriptBlock {
    /// A text block without metadata.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// A text block carrying metadata.
    pub fn text_with_metadata(text: impl Into<String>, metadata: Metadata) -> Self {
        Self::Text {
            text: text.into(),
            metadata: Some(metadata),
        }
    }

    /// Metadata attached to this block, if any.
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Self::Text { metadata, .. } => metadata.as_ref(),
        }
    }
}

/// Content of a transcript entry: either a bare string or a block list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain string content.
    Text(String),
    /// Structured block content (used for tool results).
    Blocks(Vec<TranscriptBlock>),
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who authored the entry.
    pub role: Role,
    /// What they said.
    pub content: MessageContent,
}

impl TranscriptEntry {
    /// A user entry with plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user entry with block content.
    pub fn user_blocks(blocks: Vec<TranscriptBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// An assistant entry with plain text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Detach the metadata carried by the first block of this entry.
    ///
    /// Only block-list content can carry metadata, and only the first block
    /// is inspected. The block is left in place without its metadata.
    pub fn take_leading_metadata(&mut self) -> Option<Metadata> {
        match &mut self.content {
            MessageContent::Blocks(blocks) => match blocks.first_mut() {
                Some(TranscriptBlock::Text { metadata, .. }) => metadata.take(),
                None => None,
            },
            MessageContent::Text(_) => None,
        }
    }
}

/// Schema description of a tool, as handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub input_schema: serde_json::Value,
}

/// A single content block of a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    /// Text the model wants shown to the user.
    Text {
        /// The text content.
        text: String,
    },
    /// A request to invoke a tool.
    ToolUse {
        /// Provider-assigned identifier for this invocation.
        id: String,
        /// Name of the tool to invoke.
        name: String,
        /// Tool arguments.
        input: serde_json::Value,
    },
    /// A block kind the resolver does not act on (e.g. thinking).
    Other {
        /// The provider's type tag for the block.
        kind: String,
    },
}

/// Request sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Model to use (None = provider default).
    pub model: Option<String>,
    /// System prompt.
    pub system: Option<String>,
    /// Conversation so far.
    pub messages: Vec<TranscriptEntry>,
    /// Tools the model may call.
    pub tools: Vec<ToolDescriptor>,
    /// Ceiling on generated tokens. Replies past it are truncated.
    pub max_tokens: u32,
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Model produced a final response.
    EndTurn,
    /// Model wants to use a tool.
    ToolUse,
    /// Hit the max_tokens limit.
    MaxTokens,
    /// Hit a stop sequence.
    StopSequence,
}

/// Token usage from a single provider call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens generated.
    pub output_tokens: u64,
}

/// Response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Response content blocks, in the order the model produced them.
    pub content: Vec<ResponseBlock>,
    /// Why the provider stopped.
    pub stop_reason: StopReason,
    /// Token usage.
    pub usage: TokenUsage,
    /// Actual model used.
    pub model: String,
}
