use crate::error::{ErrorKind, ProviderError, Result};
use crate::streaming::EventStream;
use crate::types::Turn;
use async_trait::async_trait;

/// Capability set every completion provider supplies
///
/// The turn handler only ever talks to this trait; each provider binds
/// its own transport and error classification.
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    /// Short provider name used in logs and store keys
    fn name(&self) -> &str;

    /// Open a streaming completion
    ///
    /// Errors returned here happen before any fragment is produced
    /// (rejected request, rate limit, connectivity). Errors inside the
    /// stream are transport or payload failures.
    async fn open_stream(&self, request: ChatRequest) -> Result<EventStream>;

    /// Classify a provider error for the failure path
    fn classify_error(&self, error: &ProviderError) -> ErrorKind {
        error.kind()
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub turns: Vec<Turn>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, turns: Vec<Turn>) -> Self {
        Self {
            model: model.into(),
            turns,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// System prompt, if the first turn carries one
    pub fn system_prompt(&self) -> Option<&str> {
        self.turns
            .first()
            .filter(|t| t.role == crate::Role::System)
            .map(|t| t.content.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}
