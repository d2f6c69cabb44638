// Anthropic Messages API client

use crate::buffer_utils::{parse_sse_stream, SseLineParser};
use crate::error::{ErrorKind, ProviderError, Result};
use crate::streaming::{EventStream, StreamEvent};
use crate::traits::{ChatRequest, StreamingProvider};
use crate::types::Role;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The Messages API requires max_tokens on every request
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Status Anthropic uses for "overloaded"
const OVERLOADED_STATUS: u16 = 529;

pub struct AnthropicClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, ANTHROPIC_API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(&api_key)
                .map_err(|_| ProviderError::Config("Invalid API key format".to_string()))?,
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
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
        })
    }

    /// System prompt goes top-level; the message list carries only user/assistant turns
    fn build_messages_request(&self, request: &ChatRequest) -> Value {
        let messages: Vec<Value> = request
            .turns
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|t| serde_json::json!({ "role": t.role.as_str(), "content": t.content }))
            .collect();

        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "stream": true,
        });

        if let Some(obj) = payload.as_object_mut() {
            if let Some(system) = request.system_prompt() {
                obj.insert("system".to_string(), serde_json::json!(system));
            }
            if let Some(temp) = request.options.temperature {
                obj.insert("temperature".to_string(), serde_json::json!(temp));
            }
            if let Some(top_p) = request.options.top_p {
                obj.insert("top_p".to_string(), serde_json::json!(top_p));
            }
        }

        payload
    }
}

#[async_trait]
impl StreamingProvider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn open_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_messages_request(&request);

        tracing::debug!(model = %request.model, "Opening Anthropic messages stream");

        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, error_text));
        }

        Ok(parse_sse_stream(response, AnthropicEventParser))
    }

    fn classify_error(&self, error: &ProviderError) -> ErrorKind {
        match error.status() {
            Some(OVERLOADED_STATUS) => ErrorKind::RateLimit,
            _ => error.kind(),
        }
    }
}

// ============================================================================
// STREAM EVENTS
// ============================================================================

#[derive(Debug, Deserialize)]
struct AnthropicEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<AnthropicDelta>,
    #[serde(default)]
    error: Option<AnthropicError>,
}

#[derive(Debug, Deserialize)]
struct AnthropicDelta {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// SSE strategy for the Messages API event format
///
/// `event:` lines are ignored; the `type` field inside each `data:` payload
/// carries the same information.
pub struct AnthropicEventParser;

impl SseLineParser for AnthropicEventParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let event: AnthropicEvent = serde_json::from_str(data)?;

        match event.event_type.as_str() {
            "content_block_delta" => Ok(event
                .delta
                .and_then(|d| d.text)
                .filter(|text| !text.is_empty())
                .map(StreamEvent::message)
                .into_iter()
                .collect()),
            "message_delta" => {
                // stop_reason arrives here; the stream is closed by message_stop
                if let Some(reason) = event.delta.and_then(|d| d.stop_reason) {
                    tracing::debug!(stop_reason = %reason, "Anthropic message finished");
                }
                Ok(Vec::new())
            }
            "message_stop" => Ok(vec![StreamEvent::done()]),
            "error" => {
                let error = event.error.unwrap_or(AnthropicError {
                    error_type: "unknown".to_string(),
                    message: "Unknown error".to_string(),
                });
                if error.error_type == "overloaded_error" {
                    Err(ProviderError::Unavailable {
                        status: OVERLOADED_STATUS,
                        message: error.message,
                    })
                } else {
                    Err(ProviderError::Stream(error.message))
                }
            }
            _ => Ok(Vec::new()),
        }
    }

    fn is_done_marker(&self, _data: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatOptions;
    use crate::types::Turn;

    #[test]
    fn test_system_prompt_is_top_level() {
        let client = AnthropicClient::new("key").unwrap();
        let request = ChatRequest::new(
            "claude-3-5-sonnet-latest",
            vec![Turn::system("be terse"), Turn::user("hi")],
        )
        .with_options(ChatOptions::new().temperature(0.2));

        let payload = client.build_messages_request(&request);

        assert_eq!(payload["system"], "be terse");
        assert_eq!(payload["messages"].as_array().unwrap().len(), 1);
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_parser_text_delta() {
        let events = AnthropicEventParser
            .parse_data_line(r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hel"}}"#)
            .unwrap();
        assert_eq!(events, vec![StreamEvent::message("Hel")]);
    }

    #[test]
    fn test_parser_ignores_bookkeeping_events() {
        let events = AnthropicEventParser
            .parse_data_line(r#"{"type":"ping"}"#)
            .unwrap();
        assert!(events.is_empty());

        let events = AnthropicEventParser
            .parse_data_line(r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"}}"#)
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_parser_stop() {
        let events = AnthropicEventParser
            .parse_data_line(r#"{"type":"message_stop"}"#)
            .unwrap();
        assert_eq!(events, vec![StreamEvent::done()]);
    }

    #[test]
    fn test_overloaded_classified_as_rate_limit() {
        let client = AnthropicClient::new("key").unwrap();
        let err = AnthropicEventParser
            .parse_data_line(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(client.classify_error(&err), ErrorKind::RateLimit);
    }
}
