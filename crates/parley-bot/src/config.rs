use config::{Config as ConfigLoader, ConfigError, Environment, File};
use parley_chat::MattermostConfig;
use parley_llm::{ProviderConfig, ProviderKind};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mattermost: MattermostConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub xai_api_key: Option<String>,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Text put in front of every streamed answer
    #[serde(default)]
    pub reply_prefix: String,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Usernames or user ids allowed to talk to the bot; empty allows everyone
    #[serde(default)]
    pub allowed_users: Vec<String>,
    #[serde(default)]
    pub admin_users: Vec<String>,
    #[serde(default)]
    pub triggers: TriggerConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            reply_prefix: String::new(),
            command_prefix: default_command_prefix(),
            allowed_users: Vec::new(),
            admin_users: Vec::new(),
            triggers: TriggerConfig::default(),
        }
    }
}

fn default_command_prefix() -> String {
    "!".to_string()
}

/// Mention (without `@`) that routes a post to each provider
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    pub chatgpt: String,
    pub anthropic: String,
    pub xai: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            chatgpt: "gpt".to_string(),
            anthropic: "claude".to_string(),
            xai: "grok".to_string(),
        }
    }
}

impl TriggerConfig {
    pub fn for_kind(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::ChatGpt => &self.chatgpt,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Xai => &self.xai,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database: default_database(),
        }
    }
}

fn default_database() -> String {
    "parley".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, e.g. `PARLEY_BOT__REPLY_PREFIX`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.mattermost.token = std::env::var("MATTERMOST_TOKEN").map_err(|_| {
            ConfigError::Message("MATTERMOST_TOKEN environment variable is required".to_string())
        })?;
        cfg.openai_api_key = secret("OPENAI_API_KEY");
        cfg.anthropic_api_key = secret("ANTHROPIC_API_KEY");
        cfg.xai_api_key = secret("XAI_API_KEY");
        cfg.mongodb_uri = secret("MONGODB_URI");

        if cfg.store.backend == StoreBackend::Mongodb && cfg.mongodb_uri.is_none() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb store".to_string(),
            ));
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    /// Providers with an API key, in a stable order
    pub fn providers(&self) -> Vec<ProviderConfig> {
        ProviderKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let key = match kind {
                    ProviderKind::ChatGpt => self.openai_api_key.as_ref(),
                    ProviderKind::Anthropic => self.anthropic_api_key.as_ref(),
                    ProviderKind::Xai => self.xai_api_key.as_ref(),
                }?;
                Some(ProviderConfig::new(kind, key.clone()))
            })
            .collect()
    }
}

fn secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
