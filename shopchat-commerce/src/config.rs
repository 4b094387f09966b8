//! Storefront connection settings.

use clap::Parser;

/// Settings for the storefront backend, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "shopchat-tool-host", about = "Spurtcommerce tools over MCP stdio")]
pub struct CommerceConfig {
    /// Base URL of the storefront API.
    #[arg(long, env = "SPURTCOMMERCE_API_URL")]
    pub api_url: String,

    /// API key sent as the `key` header.
    #[arg(long, env = "SPURTCOMMERCE_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,
}

impl CommerceConfig {
    /// Build a config directly, bypassing the command line.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}
