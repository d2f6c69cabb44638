use anyhow::{bail, Context};
use parley_chat::{ChatPlatform, ChatPost};
use parley_llm::ProviderKind;
use parley_persist::{SettingName, SettingsStore};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::Authorizer;

/// Admin command against one provider's settings
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsCommand {
    /// `!{provider} settings`
    Show(ProviderKind),
    /// `!{provider} set <name> <value>`
    Set {
        kind: ProviderKind,
        name: String,
        value: String,
    },
    /// `!{provider} reset <name>`
    Reset { kind: ProviderKind, name: String },
}

impl SettingsCommand {
    /// Parse `text`; `None` if it is not a settings command at all
    pub fn parse(command_prefix: &str, text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix(command_prefix)?;
        let (provider, rest) = split_word(rest);
        let kind: ProviderKind = provider.parse().ok()?;
        let (action, rest) = split_word(rest);

        match action.to_ascii_lowercase().as_str() {
            "settings" => Some(Self::Show(kind)),
            "set" => {
                let (name, value) = split_word(rest);
                Some(Self::Set {
                    kind,
                    name: name.to_string(),
                    value: value.to_string(),
                })
            }
            "reset" => {
                let (name, _) = split_word(rest);
                Some(Self::Reset {
                    kind,
                    name: name.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// First whitespace-separated word and the trimmed remainder
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

/// Handles `!{provider} settings|set|reset` for admins
pub struct SettingsCommandHandler {
    settings: SettingsStore,
    platform: Arc<dyn ChatPlatform>,
    authorizer: Arc<dyn Authorizer>,
    command_prefix: String,
}

impl SettingsCommandHandler {
    pub fn new(
        settings: SettingsStore,
        platform: Arc<dyn ChatPlatform>,
        authorizer: Arc<dyn Authorizer>,
        command_prefix: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            platform,
            authorizer,
            command_prefix: command_prefix.into(),
        }
    }

    /// Run the command in `post` if it is one; returns whether it was
    pub async fn handle(&self, post: &ChatPost) -> bool {
        let Some(command) = SettingsCommand::parse(&self.command_prefix, &post.message) else {
            return false;
        };

        if !self.authorizer.is_admin(post) {
            debug!(sender = %post.sender_name, "Ignoring settings command from non-admin");
            return true;
        }

        let response = match self.execute(&command).await {
            Ok(text) => text,
            Err(e) => format!("Error: {:#}", e),
        };

        if let Err(e) = self.platform.reply(post, &response).await {
            warn!(post_id = %post.id, error = %e, "Failed to reply to settings command");
        }
        true
    }

    pub async fn execute(&self, command: &SettingsCommand) -> anyhow::Result<String> {
        match command {
            SettingsCommand::Show(kind) => {
                let mut lines = vec![format!("**{} settings**", kind)];
                for name in SettingName::ALL {
                    let value = self
                        .settings
                        .get_setting(*kind, name)
                        .await
                        .with_context(|| format!("failed to read {}", name))?;
                    lines.push(format!("- `{}`: `{}`", name, value));
                }
                Ok(lines.join("\n"))
            }
            SettingsCommand::Set { kind, name, value } => {
                if value.is_empty() && name.as_str() != SettingName::System.as_str() {
                    bail!("usage: {}{} set <name> <value>", self.command_prefix, kind);
                }
                let setting: SettingName = name.parse()?;
                let stored = self.settings.set_setting(*kind, setting, value).await?;
                Ok(format!("{} `{}` set to `{}`", kind, setting, stored))
            }
            SettingsCommand::Reset { kind, name } => {
                let setting: SettingName = name.parse()?;
                let default = self.settings.reset_setting(*kind, setting).await?;
                Ok(format!("{} `{}` reset to `{}`", kind, setting, default))
            }
        }
    }
}
