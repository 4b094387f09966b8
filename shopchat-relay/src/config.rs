//! Relay configuration from flags, the environment and `.env`.

use std::path::PathBuf;

use clap::Parser;
use shopchat_mcp::{ConfigError, ToolHostCommand, load_env_file};
use shopchat_provider_anthropic::Anthropic;
use shopchat_resolver::ResolverConfig;

/// Relay settings. Every flag falls back to an environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "shopchat-relay", about = "Chat relay for the shopchat storefront assistant")]
pub struct RelayConfig {
    /// Anthropic API key.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Port the WebSocket server listens on.
    #[arg(long, env = "SOCKET_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Interface the WebSocket server binds.
    #[arg(long, env = "SOCKET_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Local tool host script. Without it the packaged server runs via npx.
    #[arg(long, env = "MCP_SERVER_PATH")]
    pub mcp_server_path: Option<PathBuf>,

    /// Runtime used to launch the local tool host script.
    #[arg(long, env = "MCP_RUNTIME", default_value = "node")]
    pub mcp_runtime: String,

    /// JSON file of environment variables for the tool host process.
    #[arg(long, env = "MCP_CONFIG", default_value = "./mcp.config.json")]
    pub mcp_config: PathBuf,

    /// Model identifier; the provider default when unset.
    #[arg(long, env = "ANTHROPIC_MODEL")]
    pub model: Option<String>,

    /// Generated-token ceiling per model call.
    #[arg(long, env = "MAX_TOKENS", default_value_t = 1000)]
    pub max_tokens: u32,

    /// Anthropic API base URL override.
    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    pub anthropic_base_url: Option<String>,
}

impl RelayConfig {
    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The tool host command with its environment file applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the environment file exists but is invalid.
    pub fn tool_host_command(&self) -> Result<ToolHostCommand, ConfigError> {
        let env = load_env_file(&self.mcp_config)?;
        Ok(
            ToolHostCommand::resolve(self.mcp_server_path.as_deref(), &self.mcp_runtime)
                .with_env(env),
        )
    }

    /// Resolver settings: the storefront system prompt and token ceiling.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            max_tokens: self.max_tokens,
            ..ResolverConfig::default()
        }
    }

    /// Anthropic client for these settings.
    pub fn provider(&self) -> Anthropic {
        let mut provider = Anthropic::new(&self.api_key);
        if let Some(model) = &self.model {
            provider = provider.model(model);
        }
        if let Some(url) = &self.anthropic_base_url {
            provider = provider.base_url(url);
        }
        provider
    }
}
