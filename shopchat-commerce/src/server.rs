//! MCP server exposing a [`ToolRegistry`] over stdio.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    ProtocolVersion, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::io::stdio;
use rmcp::{ErrorData, ServerHandler, ServiceExt};

use crate::error::CommerceError;
use crate::tool::{ToolError, ToolRegistry, ToolReply};

/// Name the server reports in the MCP handshake.
pub const SERVER_NAME: &str = "ecommerce";

/// MCP server over a tool registry.
#[derive(Clone)]
pub struct CommerceServer {
    registry: Arc<ToolRegistry>,
    name: String,
    version: String,
}

impl CommerceServer {
    /// Wrap a registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Tool listing as MCP tool definitions.
    pub fn mcp_tools(&self) -> Vec<McpTool> {
        self.registry
            .iter()
            .map(|tool| {
                let schema = tool.input_schema();
                McpTool {
                    name: Cow::Owned(tool.name().to_string()),
                    title: None,
                    description: Some(Cow::Owned(tool.description().to_string())),
                    input_schema: Arc::new(schema.as_object().cloned().unwrap_or_default()),
                    output_schema: None,
                    annotations: None,
                    execution: None,
                    icons: None,
                    meta: None,
                }
            })
            .collect()
    }

    /// Run one tool call and shape the MCP result.
    ///
    /// # Errors
    ///
    /// Unknown tools are a protocol error. Bad arguments come back as an
    /// `is_error` result the model can read.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<CallToolResult, ErrorData> {
        let input = serde_json::Value::Object(arguments.unwrap_or_default());
        tracing::info!(tool = name, "tool call");

        match self.registry.execute(name, input).await {
            Ok(reply) => Ok(reply_to_result(reply)),
            Err(ToolError::NotFound(name)) => Err(ErrorData::invalid_params(
                format!("tool not found: {name}"),
                None,
            )),
            Err(e @ ToolError::InvalidInput(_)) => {
                tracing::warn!(tool = name, error = %e, "rejected tool arguments");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    /// Serve until the client disconnects.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Server`] if the transport fails.
    pub async fn serve_stdio(self) -> Result<(), CommerceError> {
        let service = self
            .serve(stdio())
            .await
            .map_err(|e| CommerceError::Server(e.to_string()))?;
        service
            .waiting()
            .await
            .map_err(|e| CommerceError::Server(e.to_string()))?;
        Ok(())
    }
}

fn reply_to_result(reply: ToolReply) -> CallToolResult {
    let mut result = CallToolResult::success(vec![Content::text(reply.text)]);
    result.structured_content = reply.metadata;
    result
}

impl ServerHandler for CommerceServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                ..Default::default()
            },
            instructions: None,
        }
    }

    async fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.mcp_tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.dispatch(&request.name, request.arguments).await
    }
}
