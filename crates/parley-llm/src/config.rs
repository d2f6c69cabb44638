// Configuration layer for provider client creation

use crate::anthropic::AnthropicClient;
use crate::error::{ProviderError, Result};
use crate::openai::OpenAIClient;
use crate::traits::StreamingProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Supported completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Anthropic,
    Xai,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::ChatGpt, Self::Anthropic, Self::Xai];

    /// Stable name, also used to namespace store keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatGpt => "chatgpt",
            Self::Anthropic => "anthropic",
            Self::Xai => "xai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chatgpt" | "openai" | "gpt" => Ok(Self::ChatGpt),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "xai" | "grok" => Ok(Self::Xai),
            other => Err(ProviderError::Config(format!("Unknown provider: {}", other))),
        }
    }
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    /// Override the API base URL (proxies, tests)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn chatgpt(api_key: impl Into<String>) -> Self {
        Self::new(ProviderKind::ChatGpt, api_key)
    }

    pub fn anthropic(api_key: impl Into<String>) -> Self {
        Self::new(ProviderKind::Anthropic, api_key)
    }

    pub fn xai(api_key: impl Into<String>) -> Self {
        Self::new(ProviderKind::Xai, api_key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Factory for creating provider clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_provider(config: ProviderConfig) -> Result<Arc<dyn StreamingProvider>> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config(format!(
                "Missing API key for provider {}",
                config.kind
            )));
        }

        match config.kind {
            ProviderKind::ChatGpt => {
                let client = match config.base_url {
                    Some(url) => OpenAIClient::with_base_url(config.api_key, url, "chatgpt")?,
                    None => OpenAIClient::new(config.api_key)?,
                };
                Ok(Arc::new(client))
            }
            ProviderKind::Xai => {
                let client = match config.base_url {
                    Some(url) => OpenAIClient::with_base_url(config.api_key, url, "xai")?,
                    None => OpenAIClient::xai(config.api_key)?,
                };
                Ok(Arc::new(client))
            }
            ProviderKind::Anthropic => {
                let client = match config.base_url {
                    Some(url) => AnthropicClient::with_base_url(config.api_key, url)?,
                    None => AnthropicClient::new(config.api_key)?,
                };
                Ok(Arc::new(client))
            }
        }
    }
}
