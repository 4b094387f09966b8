//! WebSocket frame envelopes: `{ "event": "...", "data": ... }`.

use serde::{Deserialize, Serialize};
use shopchat_turn::{BotResponse, Transcript};

/// A newly submitted user message with the prior conversation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserMessage {
    /// The user's new text.
    pub query: String,
    /// Conversation so far, oldest first.
    #[serde(default)]
    pub context: Transcript,
}

/// Frames the browser sends.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// `user-message`
    UserMessage(UserMessage),
}

/// Frames the relay sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// `bot-response`
    BotResponse(BotResponse),
}

impl ClientEvent {
    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or an unknown event name.
    pub fn decode(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

impl ServerEvent {
    /// Encode as a text frame.
    ///
    /// # Errors
    ///
    /// Fails only if the payload cannot be serialized.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shopchat_turn::{Metadata, TranscriptEntry};

    #[test]
    fn decodes_user_message_with_context() {
        let frame = json!({
            "event": "user-message",
            "data": {
                "query": "any shoes?",
                "context": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "Hello! How can I help?"}
                ]
            }
        })
        .to_string();

        let ClientEvent::UserMessage(msg) = ClientEvent::decode(&frame).unwrap();
        assert_eq!(msg.query, "any shoes?");
        assert_eq!(
            msg.context,
            vec![
                TranscriptEntry::user("hi"),
                TranscriptEntry::assistant("Hello! How can I help?"),
            ]
        );
    }

    #[test]
    fn context_is_optional() {
        let frame = r#"{"event":"user-message","data":{"query":"hello"}}"#;
        let ClientEvent::UserMessage(msg) = ClientEvent::decode(frame).unwrap();
        assert!(msg.context.is_empty());
    }

    #[test]
    fn unknown_events_are_rejected() {
        assert!(ClientEvent::decode(r#"{"event":"typing","data":{}}"#).is_err());
        assert!(ClientEvent::decode("not json").is_err());
    }

    #[test]
    fn encodes_reply_and_failure() {
        let mut meta = Metadata::new();
        meta.insert("data".into(), json!([{"sku": "A1"}]));
        let reply = ServerEvent::BotResponse(BotResponse::reply("Here you go", Some(meta)));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&reply.encode().unwrap()).unwrap(),
            json!({
                "event": "bot-response",
                "data": {"text": "Here you go", "metadata": {"data": [{"sku": "A1"}]}}
            })
        );

        let failure = ServerEvent::BotResponse(BotResponse::Failure("❌ Error processing your request.".into()));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&failure.encode().unwrap()).unwrap(),
            json!({"event": "bot-response", "data": "❌ Error processing your request."})
        );
    }
}
