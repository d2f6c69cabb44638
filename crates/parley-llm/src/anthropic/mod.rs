mod client;

pub use client::{AnthropicClient, AnthropicEventParser, ANTHROPIC_API_BASE, ANTHROPIC_VERSION};
