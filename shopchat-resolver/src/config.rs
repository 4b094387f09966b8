//! Static configuration for a [`TurnResolver`](crate::TurnResolver).

/// Default system prompt: a courteous storefront assistant that never talks
/// about its own plumbing.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional and courteous e-commerce assistant. \
Your role is to help customers with inquiries about products, orders, returns, shipping, and account information. \
Always maintain a polite and helpful tone. Respond in clear, concise, and friendly language. \
Avoid technical jargon, internal codes, or references to tools, APIs, functions, or backend systems. \
Do not say things like \u{201c}I'll search\u{201d} or \u{201c}using a tool/function\u{201d}. \
Just respond directly with helpful information. Keep replies minimal and focused. \
If a question cannot be answered without account-specific details, politely ask the customer to contact support. \
Never break character as an e-commerce assistant.";

/// Static configuration shared by every turn a resolver drives.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// System prompt sent with every model call.
    pub system_prompt: String,
    /// Model identifier (empty = provider default).
    pub model: String,
    /// Ceiling on generated tokens per model call.
    pub max_tokens: u32,
    /// Give up after this many model calls in one turn. `None` never gives up.
    pub max_round_trips: Option<u32>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            model: String::new(),
            max_tokens: 1000,
            max_round_trips: None,
        }
    }
}
