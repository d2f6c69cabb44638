mod common;

use common::*;
use parley_bot::{Dispatcher, SettingsCommandHandler, StaticAuthorizer, TurnHandler};
use parley_chat::ChatPlatform;
use parley_llm::{ProviderKind, StreamingProvider, Turn};
use parley_persist::{
    ConversationStore, InMemoryStore, KeyValueStore, ProviderSettings, SettingName, SettingsStore,
};
use std::sync::Arc;

struct Bot {
    store: Arc<dyn KeyValueStore>,
    platform: Arc<FakePlatform>,
    chatgpt: Arc<FakeProvider>,
    anthropic: Arc<FakeProvider>,
    dispatcher: Dispatcher,
}

fn bot(platform: FakePlatform) -> Bot {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    let platform = Arc::new(platform);
    let chat_platform: Arc<dyn ChatPlatform> = platform.clone();
    let authorizer = Arc::new(StaticAuthorizer::new(Vec::<String>::new(), vec!["root"]));
    let chatgpt = Arc::new(FakeProvider::fragments(&["from gpt"]));
    let anthropic = Arc::new(FakeProvider::fragments(&["from claude"]));

    let handler = |kind: ProviderKind, provider: Arc<dyn StreamingProvider>| {
        TurnHandler::new(
            kind,
            provider,
            store.clone(),
            chat_platform.clone(),
            authorizer.clone(),
        )
    };

    let commands = SettingsCommandHandler::new(
        SettingsStore::new(store.clone()),
        chat_platform.clone(),
        authorizer.clone(),
        "!",
    );
    let gpt_provider: Arc<dyn StreamingProvider> = chatgpt.clone();
    let claude_provider: Arc<dyn StreamingProvider> = anthropic.clone();
    let dispatcher = Dispatcher::new(commands)
        .route("gpt", handler(ProviderKind::ChatGpt, gpt_provider))
        .route("claude", handler(ProviderKind::Anthropic, claude_provider));

    Bot {
        store,
        platform,
        chatgpt,
        anthropic,
        dispatcher,
    }
}

#[tokio::test(start_paused = true)]
async fn test_mention_selects_provider() {
    let trigger = post("p1", "alice", "@claude explain lifetimes");
    let bot = bot(FakePlatform::new().with_thread("p1", vec![trigger.clone()]));

    bot.dispatcher.dispatch(trigger).await;

    assert!(bot.chatgpt.requests().is_empty());
    assert_eq!(bot.anthropic.requests().len(), 1);
    assert_eq!(bot.platform.edits(), vec!["from claude".to_string()]);

    let anthropic = ConversationStore::for_provider(bot.store.clone(), ProviderKind::Anthropic);
    assert!(anthropic.exists("p1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_reply_in_owned_thread_needs_no_mention() {
    let bot = bot(FakePlatform::new());
    ConversationStore::for_provider(bot.store.clone(), ProviderKind::ChatGpt)
        .append_all("p1", &[Turn::user("q"), Turn::assistant("a")])
        .await
        .unwrap();

    bot.dispatcher
        .dispatch(reply("p2", "p1", "alice", "and then?"))
        .await;

    assert_eq!(bot.chatgpt.requests().len(), 1);
    assert!(bot.anthropic.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_posts_ignored() {
    let bot = bot(FakePlatform::new());

    bot.dispatcher
        .dispatch(post("p1", "alice", "lunch anyone?"))
        .await;
    bot.dispatcher
        .dispatch(reply("p3", "p2", "alice", "not a bot thread"))
        .await;

    assert!(bot.platform.calls().is_empty());
    assert!(bot.chatgpt.requests().is_empty());
    assert!(bot.anthropic.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_admin_sets_and_shows_settings() {
    let bot = bot(FakePlatform::new());

    bot.dispatcher
        .dispatch(post("c1", "root", "!gpt set temperature 0.5"))
        .await;
    bot.dispatcher
        .dispatch(post("c2", "root", "!gpt settings"))
        .await;

    let replies = bot.platform.replies();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0], "chatgpt `temperature` set to `0.5`");
    assert!(replies[1].contains("- `temperature`: `0.5`"));
    assert!(replies[1].contains("- `model`: `gpt-4o`"));

    let stored = SettingsStore::new(bot.store.clone())
        .load(ProviderKind::ChatGpt)
        .await
        .unwrap();
    assert_eq!(stored.temperature, 0.5);
    assert!(bot.chatgpt.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_setting_reported() {
    let bot = bot(FakePlatform::new());

    bot.dispatcher
        .dispatch(post("c1", "root", "!claude set top_p 3"))
        .await;
    bot.dispatcher
        .dispatch(post("c2", "root", "!claude reset colour"))
        .await;

    let replies = bot.platform.replies();
    assert!(replies[0].starts_with("Error:"), "{}", replies[0]);
    assert!(replies[1].starts_with("Error:"), "{}", replies[1]);
    assert_eq!(
        SettingsStore::new(bot.store.clone())
            .load(ProviderKind::Anthropic)
            .await
            .unwrap(),
        ProviderSettings::defaults(ProviderKind::Anthropic)
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_restores_default() {
    let bot = bot(FakePlatform::new());
    let settings = SettingsStore::new(bot.store.clone());
    settings
        .set_setting(ProviderKind::ChatGpt, SettingName::Stream, "false")
        .await
        .unwrap();

    bot.dispatcher
        .dispatch(post("c1", "root", "!gpt reset stream"))
        .await;

    assert_eq!(bot.platform.replies(), vec!["chatgpt `stream` reset to `true`".to_string()]);
    assert!(settings.load(ProviderKind::ChatGpt).await.unwrap().stream);
}

#[tokio::test(start_paused = true)]
async fn test_non_admin_command_silently_ignored() {
    let bot = bot(FakePlatform::new());

    bot.dispatcher
        .dispatch(post("c1", "alice", "!gpt set model gpt-3.5-turbo"))
        .await;

    assert!(bot.platform.calls().is_empty());
    assert!(bot.chatgpt.requests().is_empty());
    assert_eq!(
        SettingsStore::new(bot.store.clone())
            .load(ProviderKind::ChatGpt)
            .await
            .unwrap()
            .model,
        "gpt-4o"
    );
}
