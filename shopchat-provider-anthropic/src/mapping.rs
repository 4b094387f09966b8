//! Request/response mapping between shopchat types and the Anthropic Messages API format.
//!
//! Reference: <https://docs.anthropic.com/en/api/messages>

use shopchat_turn::{
    MessageContent, ModelRequest, ModelResponse, ProviderError, ResponseBlock, Role, StopReason,
    TokenUsage, ToolDescriptor, TranscriptBlock, TranscriptEntry,
};

// ─── Request mapping ─────────────────────────────────────────────────────────

/// Convert a [`ModelRequest`] into the Anthropic Messages API JSON body.
///
/// Block metadata is never written: it exists for the chat UI only.
#[must_use]
pub fn to_api_request(req: &ModelRequest, default_model: &str) -> serde_json::Value {
    let model = req.model.as_deref().unwrap_or(default_model);

    let mut body = serde_json::json!({
        "model": model,
        "messages": map_messages(&req.messages),
        "max_tokens": req.max_tokens,
    });

    if let Some(system) = &req.system {
        body["system"] = serde_json::Value::String(system.clone());
    }

    if !req.tools.is_empty() {
        body["tools"] =
            serde_json::Value::Array(req.tools.iter().map(map_tool_descriptor).collect());
    }

    body
}

/// Map transcript entries to Anthropic's message array.
fn map_messages(messages: &[TranscriptEntry]) -> serde_json::Value {
    let arr: Vec<serde_json::Value> = messages
        .iter()
        .map(|entry| {
            let role = match entry.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            serde_json::json!({ "role": role, "content": map_content(&entry.content) })
        })
        .collect();
    serde_json::Value::Array(arr)
}

/// Plain strings stay strings; block lists become content arrays.
fn map_content(content: &MessageContent) -> serde_json::Value {
    match content {
        MessageContent::Text(text) => serde_json::Value::String(text.clone()),
        MessageContent::Blocks(blocks) => {
            serde_json::Value::Array(blocks.iter().map(map_block).collect())
        }
    }
}

fn map_block(block: &TranscriptBlock) -> serde_json::Value {
    match block {
        TranscriptBlock::Text { text, .. } => serde_json::json!({
            "type": "text",
            "text": text,
        }),
    }
}

fn map_tool_descriptor(tool: &ToolDescriptor) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.input_schema,
    })
}

// ─── Response mapping ─────────────────────────────────────────────────────────

/// Parse an Anthropic Messages API response JSON into a [`ModelResponse`].
///
/// # Errors
///
/// Returns [`ProviderError::InvalidResponse`] if required fields are missing or malformed.
pub fn from_api_response(body: &serde_json::Value) -> Result<ModelResponse, ProviderError> {
    let model = body["model"]
        .as_str()
        .ok_or_else(|| ProviderError::InvalidResponse("missing 'model' in response".into()))?
        .to_string();

    let content_arr = body["content"].as_array().ok_or_else(|| {
        ProviderError::InvalidResponse("missing 'content' array in response".into())
    })?;

    let mut content = Vec::with_capacity(content_arr.len());
    for block in content_arr {
        content.push(parse_content_block(block)?);
    }

    let stop_reason = body["stop_reason"]
        .as_str()
        .map(parse_stop_reason)
        .unwrap_or(StopReason::EndTurn);

    Ok(ModelResponse {
        content,
        stop_reason,
        usage: parse_usage(&body["usage"]),
        model,
    })
}

/// Parse a single content block from the Anthropic response JSON.
fn parse_content_block(block: &serde_json::Value) -> Result<ResponseBlock, ProviderError> {
    let block_type = block["type"]
        .as_str()
        .ok_or_else(|| ProviderError::InvalidResponse("content block missing 'type'".into()))?;

    match block_type {
        "text" => {
            let text = block["text"]
                .as_str()
                .ok_or_else(|| ProviderError::InvalidResponse("text block missing 'text'".into()))?
                .to_string();
            Ok(ResponseBlock::Text { text })
        }
        "tool_use" => {
            let id = block["id"]
                .as_str()
                .ok_or_else(|| {
                    ProviderError::InvalidResponse("tool_use block missing 'id'".into())
                })?
                .to_string();
            let name = block["name"]
                .as_str()
                .ok_or_else(|| {
                    ProviderError::InvalidResponse("tool_use block missing 'name'".into())
                })?
                .to_string();
            let input = block["input"].clone();
            Ok(ResponseBlock::ToolUse { id, name, input })
        }
        other => Ok(ResponseBlock::Other {
            kind: other.to_string(),
        }),
    }
}

fn parse_usage(usage: &serde_json::Value) -> TokenUsage {
    TokenUsage {
        input_tokens: usage["input_tokens"].as_u64().unwrap_or(0),
        output_tokens: usage["output_tokens"].as_u64().unwrap_or(0),
    }
}

/// Map an Anthropic `stop_reason` string to a [`StopReason`].
fn parse_stop_reason(reason: &str) -> StopReason {
    match reason {
        "tool_use" => StopReason::ToolUse,
        "max_tokens" => StopReason::MaxTokens,
        "stop_sequence" => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
