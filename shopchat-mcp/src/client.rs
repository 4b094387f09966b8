//! [`ToolHost`] backed by an MCP server running as a child process.

use std::borrow::Cow;
use std::future::Future;

use rmcp::ServiceExt;
use rmcp::model::{CallToolRequestParams, CallToolResult, RawContent, Tool as McpTool};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::child_process::TokioChildProcess;
use shopchat_turn::{
    Metadata, ToolDescriptor, ToolHost, ToolHostError, ToolOutput, TranscriptBlock,
};

use crate::command::ToolHostCommand;
use crate::error::{from_init_error, from_service_error};

/// A live MCP session with the tool host.
///
/// One handle serves one turn: connect at turn start, [`close`](Self::close)
/// at turn end whether the turn succeeded or not.
pub struct McpToolHost {
    service: RunningService<RoleClient, ()>,
}

impl McpToolHost {
    /// Spawn the tool host and complete the MCP handshake.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHostError::Connection`] if the process cannot be spawned
    /// or the handshake fails.
    pub async fn connect_stdio(command: &ToolHostCommand) -> Result<Self, ToolHostError> {
        tracing::debug!(program = %command.program, args = ?command.args, "spawning tool host");
        let transport = TokioChildProcess::new(command.to_command()).map_err(from_init_error)?;
        let service = ().serve(transport).await.map_err(from_init_error)?;
        Ok(Self { service })
    }

    /// Shut down the session and the child process.
    ///
    /// # Errors
    ///
    /// Returns [`ToolHostError::Connection`] if the service task failed.
    pub async fn close(self) -> Result<(), ToolHostError> {
        self.service
            .cancel()
            .await
            .map_err(|e| ToolHostError::Connection(e.to_string()))?;
        Ok(())
    }
}

impl ToolHost for McpToolHost {
    fn list_tools(
        &self,
    ) -> impl Future<Output = Result<Vec<ToolDescriptor>, ToolHostError>> + Send {
        async move {
            let tools = self
                .service
                .list_all_tools()
                .await
                .map_err(from_service_error)?;
            tracing::debug!(count = tools.len(), "listed tool host tools");
            Ok(tools.iter().map(descriptor_from_mcp).collect())
        }
    }

    fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> impl Future<Output = Result<ToolOutput, ToolHostError>> + Send {
        let name: Cow<'static, str> = Cow::Owned(name.to_string());
        async move {
            let arguments = match arguments {
                serde_json::Value::Object(map) => Some(map),
                serde_json::Value::Null => None,
                other => {
                    return Err(ToolHostError::Protocol(format!(
                        "tool arguments must be an object, got {other}"
                    )));
                }
            };

            let params = CallToolRequestParams {
                meta: None,
                name,
                arguments,
                task: None,
            };

            let result = self
                .service
                .peer()
                .call_tool(params)
                .await
                .map_err(from_service_error)?;

            Ok(call_result_to_output(result))
        }
    }
}

fn descriptor_from_mcp(tool: &McpTool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.as_deref().unwrap_or("").to_string(),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

/// Convert an MCP call result into transcript blocks.
///
/// Text items become text blocks and other content kinds are skipped. The
/// result's structured content becomes the metadata of the first block; a
/// non-object value is wrapped as `{"data": value}`. Results flagged
/// `is_error` are kept as ordinary content: the model reads the failure text.
#[must_use]
pub fn call_result_to_output(result: CallToolResult) -> ToolOutput {
    if result.is_error == Some(true) {
        tracing::debug!("tool host reported a tool error");
    }

    let mut content: Vec<TranscriptBlock> = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(TranscriptBlock::text(t.text.clone())),
            _ => None,
        })
        .collect();

    if let Some(structured) = result.structured_content {
        let metadata = match structured {
            serde_json::Value::Object(map) => map,
            other => {
                let mut map = Metadata::new();
                map.insert("data".into(), other);
                map
            }
        };
        match content.first_mut() {
            Some(TranscriptBlock::Text { metadata: slot, .. }) => *slot = Some(metadata),
            None => tracing::debug!("structured content without a text block, dropped"),
        }
    }

    ToolOutput { content }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;
    use serde_json::json;
    use std::sync::Arc;

    fn product_tool() -> McpTool {
        let schema = json!({"type": "object", "properties": {"sku": {"type": "string"}}});
        McpTool {
            name: Cow::Borrowed("get_product_by_sku"),
            title: None,
            description: Some(Cow::Borrowed("Fetch a product's details by SKU")),
            input_schema: Arc::new(schema.as_object().unwrap().clone()),
            output_schema: None,
            annotations: None,
            execution: None,
            icons: None,
            meta: None,
        }
    }

    #[test]
    fn descriptor_copies_name_description_and_schema() {
        let desc = descriptor_from_mcp(&product_tool());
        assert_eq!(desc.name, "get_product_by_sku");
        assert_eq!(desc.description, "Fetch a product's details by SKU");
        assert_eq!(desc.input_schema["properties"]["sku"]["type"], "string");
    }

    #[test]
    fn missing_description_is_empty() {
        let mut tool = product_tool();
        tool.description = None;
        assert_eq!(descriptor_from_mcp(&tool).description, "");
    }

    #[test]
    fn text_content_becomes_blocks() {
        let result = CallToolResult::success(vec![
            Content::text("🛍️ Product: Tee"),
            Content::text("second"),
        ]);
        let out = call_result_to_output(result);
        assert_eq!(
            out.content,
            vec![
                TranscriptBlock::text("🛍️ Product: Tee"),
                TranscriptBlock::text("second"),
            ]
        );
    }

    #[test]
    fn structured_content_lands_on_first_block() {
        let mut result = CallToolResult::success(vec![
            Content::text("Found products:"),
            Content::text("tail"),
        ]);
        result.structured_content = Some(json!({"data": [{"sku": "A1"}]}));

        let out = call_result_to_output(result);
        let meta = out.content[0].metadata().unwrap();
        assert_eq!(meta["data"][0]["sku"], "A1");
        assert!(out.content[1].metadata().is_none());
    }

    #[test]
    fn non_object_structured_content_is_wrapped() {
        let mut result = CallToolResult::success(vec![Content::text("list")]);
        result.structured_content = Some(json!([1, 2]));
        let out = call_result_to_output(result);
        assert_eq!(out.content[0].metadata().unwrap()["data"], json!([1, 2]));
    }

    #[test]
    fn error_results_stay_conversational() {
        let result = CallToolResult::error(vec![Content::text("❌ Error searching products: down")]);
        let out = call_result_to_output(result);
        assert_eq!(out, ToolOutput::text("❌ Error searching products: down"));
    }

    #[test]
    fn empty_content_passes_through() {
        let out = call_result_to_output(CallToolResult::success(vec![]));
        assert!(out.content.is_empty());
    }

    #[test]
    fn host_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<McpToolHost>();
    }
}
