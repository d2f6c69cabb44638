use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_bot::{
    config::{Config, StoreBackend},
    BotState,
};
use parley_chat::{ChatPlatform, MattermostClient, MattermostListener};
use parley_persist::{InMemoryStore, KeyValueStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Parley bot");
    tracing::info!("Mattermost server: {}", config.mattermost.url);

    let providers = config.providers();
    if providers.is_empty() {
        anyhow::bail!("No provider API key set (OPENAI_API_KEY, ANTHROPIC_API_KEY or XAI_API_KEY)");
    }

    let store = connect_store(&config).await?;

    let client = MattermostClient::connect(&config.mattermost)
        .await
        .context("Failed to connect to Mattermost")?;
    let listener = MattermostListener::new(config.mattermost.clone(), client.bot_user_id());
    let platform: Arc<dyn ChatPlatform> = Arc::new(client);

    let state = BotState::new(config, store, platform);
    let dispatcher = Arc::new(state.dispatcher(providers)?);

    let posts = listener.start();

    tokio::select! {
        _ = dispatcher.run(posts) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
    }

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory store; history is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        #[cfg(feature = "mongodb")]
        StoreBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let uri = config
                .mongodb_uri
                .as_deref()
                .context("MONGODB_URI is not set")?;
            let store = parley_persist::MongoStore::connect(uri, &config.store.database).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongodb"))]
        StoreBackend::Mongodb => {
            anyhow::bail!("Built without the mongodb feature")
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
