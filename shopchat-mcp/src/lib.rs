#![deny(missing_docs)]
//! MCP tool host client for shopchat.
//!
//! [`McpToolHost`] spawns the tool host as a child process, speaks MCP over
//! its stdio and implements [`ToolHost`](shopchat_turn::ToolHost) so the turn
//! resolver can list and call its tools. [`ToolHostCommand`] decides which
//! process to launch and with what environment.

pub mod client;
pub mod command;
pub(crate) mod error;

pub use client::{McpToolHost, call_result_to_output};
pub use command::{ConfigError, DEFAULT_PACKAGE, ToolHostCommand, load_env_file};
