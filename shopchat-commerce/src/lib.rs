#![deny(missing_docs)]
//! Spurtcommerce storefront tools for shopchat.
//!
//! [`StorefrontClient`] talks to the storefront REST API. The tools in
//! [`tools`] wrap it, and [`CommerceServer`] serves them to the relay over
//! MCP stdio. The `shopchat-tool-host` binary wires the three together.

pub mod config;
pub mod error;
pub mod server;
pub mod storefront;
pub mod tool;
pub mod tools;

pub use config::CommerceConfig;
pub use error::CommerceError;
pub use server::CommerceServer;
pub use storefront::{ProductQuery, StorefrontClient, StorefrontError};
pub use tool::{CommerceTool, ToolDyn, ToolError, ToolRegistry, ToolReply};
pub use tools::storefront_registry;
