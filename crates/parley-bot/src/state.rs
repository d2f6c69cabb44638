use parley_chat::ChatPlatform;
use parley_llm::{ClientFactory, ProviderConfig};
use parley_persist::{KeyValueStore, SettingsStore};
use std::sync::Arc;

use crate::auth::{Authorizer, StaticAuthorizer};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::handlers::{SettingsCommandHandler, TurnHandler};

/// Shared resources every handler is built from
#[derive(Clone)]
pub struct BotState {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyValueStore>,
    pub platform: Arc<dyn ChatPlatform>,
    pub authorizer: Arc<dyn Authorizer>,
}

impl BotState {
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>, platform: Arc<dyn ChatPlatform>) -> Self {
        let authorizer = Arc::new(StaticAuthorizer::new(
            &config.bot.allowed_users,
            &config.bot.admin_users,
        ));

        Self {
            config: Arc::new(config),
            store,
            platform,
            authorizer,
        }
    }

    /// Build the dispatcher with one turn handler per configured provider
    pub fn dispatcher(&self, providers: Vec<ProviderConfig>) -> anyhow::Result<Dispatcher> {
        let bot = &self.config.bot;
        let commands = SettingsCommandHandler::new(
            SettingsStore::new(self.store.clone()),
            self.platform.clone(),
            self.authorizer.clone(),
            bot.command_prefix.clone(),
        );

        let mut dispatcher = Dispatcher::new(commands);
        for provider_config in providers {
            let kind = provider_config.kind;
            let provider = ClientFactory::create_provider(provider_config)?;
            let handler = TurnHandler::new(
                kind,
                provider,
                self.store.clone(),
                self.platform.clone(),
                self.authorizer.clone(),
            )
            .with_reply_prefix(bot.reply_prefix.clone())
            .with_command_prefix(bot.command_prefix.clone());

            tracing::info!(provider = %kind, trigger = %bot.triggers.for_kind(kind), "Provider enabled");
            dispatcher = dispatcher.route(bot.triggers.for_kind(kind), handler);
        }

        Ok(dispatcher)
    }
}
