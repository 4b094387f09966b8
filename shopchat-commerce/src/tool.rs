//! Tool traits and the registry the MCP server serves from.
//!
//! [`CommerceTool`] is the strongly-typed trait tools implement.
//! [`ToolDyn`] is its object-safe twin, blanket-implemented for every
//! `CommerceTool`, so a [`ToolRegistry`] can hold them side by side.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Boxed future returned by [`ToolDyn::call_dyn`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a tool hands back: display text plus optional UI data.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReply {
    /// Text the model reads.
    pub text: String,
    /// Structured payload for the chat UI, e.g. `{ "data": [...] }`.
    pub metadata: Option<Value>,
}

impl ToolReply {
    /// A text-only reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    /// A reply carrying UI data.
    pub fn with_metadata(text: impl Into<String>, metadata: Value) -> Self {
        Self {
            text: text.into(),
            metadata: Some(metadata),
        }
    }
}

/// Errors raised before a tool gets to run.
///
/// Backend failures are not errors: tools turn them into `❌` replies.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// No tool with that name is registered.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The arguments did not match the tool's input schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A storefront tool with typed arguments.
pub trait CommerceTool: Send + Sync {
    /// Unique tool name.
    const NAME: &'static str;
    /// One-line description shown to the model.
    const DESCRIPTION: &'static str;
    /// Arguments; the input schema is derived from this type.
    type Args: DeserializeOwned + schemars::JsonSchema + Send;

    /// Run the tool.
    fn call(&self, args: Self::Args) -> impl Future<Output = ToolReply> + Send;
}

/// Object-safe tool interface. Blanket-implemented for all [`CommerceTool`]s.
pub trait ToolDyn: Send + Sync {
    /// Tool name.
    fn name(&self) -> &str;
    /// Tool description.
    fn description(&self) -> &str;
    /// JSON Schema of the arguments object.
    fn input_schema(&self) -> Value;
    /// Decode the arguments and run the tool.
    fn call_dyn(&self, input: Value) -> BoxFuture<'_, Result<ToolReply, ToolError>>;
}

impl<T: CommerceTool> ToolDyn for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        input_schema_for::<T::Args>()
    }

    fn call_dyn(&self, input: Value) -> BoxFuture<'_, Result<ToolReply, ToolError>> {
        Box::pin(async move {
            let args: T::Args = serde_json::from_value(input)
                .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
            Ok(self.call(args).await)
        })
    }
}

/// Derive an MCP-ready input schema: an object schema without the
/// `$schema` and `title` annotations.
pub fn input_schema_for<A: schemars::JsonSchema>() -> Value {
    let schema = schemars::schema_for!(A);
    let mut value =
        serde_json::to_value(&schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.entry("properties")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    value
}

/// Name-ordered collection of type-erased tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed tool.
    pub fn register<T: CommerceTool + 'static>(&mut self, tool: T) {
        self.tools.insert(T::NAME.to_string(), Arc::new(tool));
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolDyn>> {
        self.tools.get(name).cloned()
    }

    /// Iterate tools in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ToolDyn>> {
        self.tools.values()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name.
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`] for unknown names, [`ToolError::InvalidInput`]
    /// when the arguments do not decode.
    pub async fn execute(&self, name: &str, input: Value) -> Result<ToolReply, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.call_dyn(input).await
    }
}
