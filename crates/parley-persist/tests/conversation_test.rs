use parley_llm::{ProviderKind, Turn};
use parley_persist::{ConversationStore, InMemoryStore, KeyValueStore};
use std::sync::Arc;
use std::time::Duration;

fn store() -> (Arc<InMemoryStore>, ConversationStore) {
    let kv = Arc::new(InMemoryStore::new());
    let conversations = ConversationStore::for_provider(kv.clone(), ProviderKind::ChatGpt);
    (kv, conversations)
}

#[tokio::test]
async fn test_key_is_namespaced_per_provider() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    let chatgpt = ConversationStore::for_provider(kv.clone(), ProviderKind::ChatGpt);
    let anthropic = ConversationStore::for_provider(kv, ProviderKind::Anthropic);

    assert_eq!(chatgpt.key("abc"), "chatgpt_thread_abc");
    assert_eq!(anthropic.key("abc"), "anthropic_thread_abc");

    chatgpt.append("abc", &Turn::user("hi")).await.unwrap();
    assert!(chatgpt.exists("abc").await.unwrap());
    assert!(!anthropic.exists("abc").await.unwrap());
}

#[tokio::test]
async fn test_append_and_load_preserves_order() {
    let (_, conversations) = store();

    conversations
        .append_all("t1", &[Turn::user("q1"), Turn::assistant("a1")])
        .await
        .unwrap();
    conversations.append("t1", &Turn::user("q2")).await.unwrap();

    let turns = conversations.load("t1").await.unwrap();
    assert_eq!(turns, vec![Turn::user("q1"), Turn::assistant("a1"), Turn::user("q2")]);
}

#[tokio::test]
async fn test_append_user_merges_into_trailing_user_turn() {
    let (_, conversations) = store();
    let mut history = vec![Turn::user("first")];
    conversations.append_all("t1", &history).await.unwrap();

    conversations
        .append_user("t1", &mut history, "second")
        .await
        .unwrap();

    assert_eq!(history, vec![Turn::user("first\nsecond")]);
    assert_eq!(conversations.load("t1").await.unwrap(), history);
}

#[tokio::test]
async fn test_append_user_pushes_after_assistant() {
    let (_, conversations) = store();
    let mut history = vec![Turn::user("q"), Turn::assistant("a")];
    conversations.append_all("t1", &history).await.unwrap();

    conversations
        .append_user("t1", &mut history, "follow-up")
        .await
        .unwrap();

    assert_eq!(history.len(), 3);
    assert_eq!(conversations.load("t1").await.unwrap(), history);
}

#[tokio::test]
async fn test_retention_expiry() {
    let (_, conversations) = store();
    let conversations = conversations.with_retention(Duration::ZERO);

    conversations.append("t1", &Turn::user("gone soon")).await.unwrap();

    assert!(!conversations.exists("t1").await.unwrap());
    assert!(conversations.load("t1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear() {
    let (kv, conversations) = store();
    conversations.append("t1", &Turn::user("x")).await.unwrap();
    conversations.clear("t1").await.unwrap();

    assert!(!kv.exists("chatgpt_thread_t1").await.unwrap());
}
