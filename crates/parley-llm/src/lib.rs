pub mod types;
pub mod error;
pub mod traits;
pub mod history;
pub mod streaming;
pub mod buffer_utils;
pub mod openai;
pub mod anthropic;
pub mod config;

pub use traits::{StreamingProvider, ChatRequest, ChatOptions};
pub use error::{ErrorKind, ProviderError, Result};
pub use streaming::{StreamEvent, EventStream};
pub use history::{merge_user_turns, with_system_prompt};
pub use openai::OpenAIClient;
pub use anthropic::AnthropicClient;
pub use config::{ClientFactory, ProviderConfig, ProviderKind};
pub use types::{Role, Turn};
