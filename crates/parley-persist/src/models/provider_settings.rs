use parley_llm::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PersistError, Result};

/// Upper bound for the stream update delay; anything slower defeats streaming
const MAX_UPDATE_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingName {
    Model,
    Temperature,
    TopP,
    System,
    Stream,
    StreamUpdateDelayMs,
}

impl SettingName {
    pub const ALL: [SettingName; 6] = [
        Self::Model,
        Self::Temperature,
        Self::TopP,
        Self::System,
        Self::Stream,
        Self::StreamUpdateDelayMs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Temperature => "temperature",
            Self::TopP => "top_p",
            Self::System => "system",
            Self::Stream => "stream",
            Self::StreamUpdateDelayMs => "stream_update_delay_ms",
        }
    }

    /// Check a raw value for `kind` and return it in canonical form
    pub fn validate(&self, kind: ProviderKind, raw: &str) -> Result<String> {
        let invalid = |reason: &str| PersistError::InvalidSetting {
            name: self.as_str().to_string(),
            reason: reason.to_string(),
        };
        let raw = raw.trim();

        match self {
            Self::Model => {
                if raw.is_empty() || raw.contains(char::is_whitespace) {
                    return Err(invalid("model must be a single non-empty word"));
                }
                Ok(raw.to_string())
            }
            Self::Temperature => {
                let value: f32 = raw.parse().map_err(|_| invalid("expected a number"))?;
                let max = max_temperature(kind);
                if !(0.0..=max).contains(&value) {
                    return Err(invalid(&format!("must be between 0 and {}", max)));
                }
                Ok(value.to_string())
            }
            Self::TopP => {
                let value: f32 = raw.parse().map_err(|_| invalid("expected a number"))?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(invalid("must be between 0 and 1"));
                }
                Ok(value.to_string())
            }
            Self::System => Ok(raw.to_string()),
            Self::Stream => parse_bool(raw)
                .map(|b| b.to_string())
                .ok_or_else(|| invalid("expected true or false")),
            Self::StreamUpdateDelayMs => {
                let value: u64 = raw.parse().map_err(|_| invalid("expected milliseconds"))?;
                if value > MAX_UPDATE_DELAY_MS {
                    return Err(invalid("must be at most 60000"));
                }
                Ok(value.to_string())
            }
        }
    }
}

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingName {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s.trim())
            .ok_or_else(|| PersistError::UnknownSetting(s.to_string()))
    }
}

/// Anthropic rejects temperatures above 1
fn max_temperature(kind: ProviderKind) -> f32 {
    match kind {
        ProviderKind::Anthropic => 1.0,
        ProviderKind::ChatGpt | ProviderKind::Xai => 2.0,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolved settings for one provider, injected into each turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub system: String,
    pub stream: bool,
    pub stream_update_delay_ms: u64,
}

impl ProviderSettings {
    /// Hard-coded defaults per provider
    pub fn defaults(kind: ProviderKind) -> Self {
        let model = match kind {
            ProviderKind::ChatGpt => "gpt-4o",
            ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
            ProviderKind::Xai => "grok-2-latest",
        };

        Self {
            model: model.to_string(),
            temperature: 1.0,
            top_p: 1.0,
            system: String::new(),
            stream: true,
            stream_update_delay_ms: 200,
        }
    }

    pub fn default_value(kind: ProviderKind, name: SettingName) -> String {
        Self::defaults(kind).get(name)
    }

    /// Canonical string form of one setting
    pub fn get(&self, name: SettingName) -> String {
        match name {
            SettingName::Model => self.model.clone(),
            SettingName::Temperature => self.temperature.to_string(),
            SettingName::TopP => self.top_p.to_string(),
            SettingName::System => self.system.clone(),
            SettingName::Stream => self.stream.to_string(),
            SettingName::StreamUpdateDelayMs => self.stream_update_delay_ms.to_string(),
        }
    }

    /// Build from stored raw values; unset or corrupt entries use the default
    pub fn from_map(kind: ProviderKind, raw: &HashMap<String, String>) -> Self {
        let mut settings = Self::defaults(kind);

        for name in SettingName::ALL {
            let Some(value) = raw.get(name.as_str()) else {
                continue;
            };
            if let Err(e) = settings.apply(kind, name, value) {
                tracing::warn!(provider = %kind, setting = %name, "Ignoring stored setting: {}", e);
            }
        }

        settings
    }

    fn apply(&mut self, kind: ProviderKind, name: SettingName, raw: &str) -> Result<()> {
        let value = name.validate(kind, raw)?;
        let parse_err = |_| PersistError::Internal(format!("Unparseable {}", name));

        match name {
            SettingName::Model => self.model = value,
            SettingName::Temperature => self.temperature = value.parse().map_err(parse_err)?,
            SettingName::TopP => self.top_p = value.parse().map_err(parse_err)?,
            SettingName::System => self.system = value,
            SettingName::Stream => self.stream = value == "true",
            SettingName::StreamUpdateDelayMs => {
                self.stream_update_delay_ms = value
                    .parse()
                    .map_err(|_| PersistError::Internal(format!("Unparseable {}", name)))?
            }
        }
        Ok(())
    }

    pub fn update_delay(&self) -> Duration {
        Duration::from_millis(self.stream_update_delay_ms)
    }
}
