mod client;

pub use client::{OpenAIClient, OpenAIChunkParser, ChatStreamChunk, OPENAI_API_BASE, XAI_API_BASE};
