use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{PlatformError, Result};

/// Connection settings for a Mattermost server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MattermostConfig {
    /// Server URL, e.g. `https://chat.example.com`
    pub url: String,
    /// Bot access token; read from `MATTERMOST_TOKEN`
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl MattermostConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// REST API root (`{url}/api/v4`)
    pub fn api_base(&self) -> String {
        format!("{}/api/v4", self.url.trim_end_matches('/'))
    }

    /// WebSocket endpoint derived from the server URL
    pub fn websocket_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/websocket", self.api_base()))?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(PlatformError::Config(format!(
                    "Unsupported URL scheme: {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| PlatformError::Config(format!("Cannot use scheme {}", scheme)))?;
        Ok(url)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(PlatformError::Config("Mattermost URL is empty".to_string()));
        }
        if self.token.trim().is_empty() {
            return Err(PlatformError::Config("MATTERMOST_TOKEN is not set".to_string()));
        }
        Url::parse(&self.url)?;
        Ok(())
    }
}
