#![deny(missing_docs)]
//! Anthropic Messages API provider for shopchat.
//!
//! [`Anthropic`] implements [`Provider`](shopchat_turn::Provider) with a
//! single non-streaming `POST /v1/messages` per model call.

pub mod client;
pub(crate) mod error;
pub mod mapping;

pub use client::Anthropic;

// Re-export for convenience
pub use shopchat_turn::{Provider, ProviderError};
