// OpenAI-compatible chat completions client (OpenAI, xAI)

use crate::buffer_utils::{parse_sse_stream, SseLineParser};
use crate::error::{ProviderError, Result};
use crate::streaming::{EventStream, StreamEvent};
use crate::traits::{ChatRequest, StreamingProvider};
use crate::types::Turn;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const XAI_API_BASE: &str = "https://api.x.ai/v1";

/// OpenAI-compatible client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
    name: String,
}

impl OpenAIClient {
    /// Create new client against the OpenAI API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, OPENAI_API_BASE, "chatgpt")
    }

    /// Create new client against the xAI API (OpenAI wire format)
    pub fn xai(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, XAI_API_BASE, "xai")
    }

    /// Create a client for any OpenAI-compatible endpoint
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| ProviderError::Config("Invalid API key format".to_string()))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .read_timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            name: name.into(),
        })
    }

    /// Build chat completion request payload
    fn build_chat_request(&self, request: &ChatRequest) -> Value {
        let messages: Vec<Value> = request.turns.iter().map(convert_turn).collect();

        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "stream": true,
        });

        if let Some(obj) = payload.as_object_mut() {
            // o1 and gpt-5 models reject sampling parameters
            let is_reasoning_model =
                request.model.starts_with("o1") || request.model.starts_with("gpt-5");

            if !is_reasoning_model {
                if let Some(temp) = request.options.temperature {
                    obj.insert("temperature".to_string(), serde_json::json!(temp));
                }
                if let Some(top_p) = request.options.top_p {
                    obj.insert("top_p".to_string(), serde_json::json!(top_p));
                }
            }
            if let Some(max_tokens) = request.options.max_tokens {
                let token_field = if is_reasoning_model {
                    "max_completion_tokens"
                } else {
                    "max_tokens"
                };
                obj.insert(token_field.to_string(), serde_json::json!(max_tokens));
            }
        }

        payload
    }
}

fn convert_turn(turn: &Turn) -> Value {
    serde_json::json!({
        "role": turn.role.as_str(),
        "content": turn.content,
    })
}

#[async_trait]
impl StreamingProvider for OpenAIClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_chat_request(&request);

        tracing::debug!(provider = %self.name, model = %request.model, "Opening chat completion stream");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, error_text));
        }

        Ok(parse_sse_stream(response, OpenAIChunkParser))
    }
}

// ============================================================================
// STREAM CHUNKS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = self.choices.first() {
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::message(content.clone()));
                }
            }

            if let Some(finish_reason) = &choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: Some(finish_reason.clone()),
                });
            }
        }

        events
    }
}

/// SSE strategy for the chat completions wire format
pub struct OpenAIChunkParser;

impl SseLineParser for OpenAIChunkParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let chunk: ChatStreamChunk = serde_json::from_str(data)?;

        if let Some(error) = chunk.error {
            return Err(ProviderError::Stream(error.message));
        }

        Ok(chunk.to_stream_events())
    }
}
