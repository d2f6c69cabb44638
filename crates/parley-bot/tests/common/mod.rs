#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use parley_bot::{StaticAuthorizer, TurnHandler};
use parley_chat::{ChatPlatform, ChatPost, PlatformError};
use parley_llm::{
    ChatRequest, EventStream, ProviderError, ProviderKind, StreamEvent, StreamingProvider,
};
use parley_persist::{InMemoryStore, KeyValueStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BOT_ID: &str = "bot";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetThread(String),
    Reply { root: String, message: String, id: String },
    Edit { post_id: String, message: String },
    AddReaction { post_id: String, emoji: String },
    RemoveReaction { post_id: String, emoji: String },
}

/// In-memory chat platform that records every call
#[derive(Default)]
pub struct FakePlatform {
    threads: Mutex<HashMap<String, Vec<ChatPost>>>,
    calls: Mutex<Vec<Call>>,
    reactions: Mutex<HashMap<String, HashSet<String>>>,
    next_id: AtomicUsize,
    fail_thread_fetch: bool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_thread_fetch() -> Self {
        Self {
            fail_thread_fetch: true,
            ..Self::default()
        }
    }

    pub fn with_thread(self, thread_id: &str, posts: Vec<ChatPost>) -> Self {
        self.threads.lock().unwrap().insert(thread_id.to_string(), posts);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Edit { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn replies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reply { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn thread_fetches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::GetThread(_)))
            .count()
    }

    /// Reactions currently on a post
    pub fn reactions(&self, post_id: &str) -> HashSet<String> {
        self.reactions
            .lock()
            .unwrap()
            .get(post_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Position of the first call matching `f`
    pub fn position(&self, f: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(f)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    fn bot_user_id(&self) -> &str {
        BOT_ID
    }

    async fn get_thread(&self, thread_id: &str) -> parley_chat::Result<Vec<ChatPost>> {
        self.record(Call::GetThread(thread_id.to_string()));
        if self.fail_thread_fetch {
            return Err(PlatformError::Api {
                status: 500,
                message: "thread unavailable".to_string(),
            });
        }
        Ok(self
            .threads
            .lock()
            .unwrap()
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn reply(&self, to: &ChatPost, message: &str) -> parley_chat::Result<String> {
        let id = format!("reply-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.record(Call::Reply {
            root: to.thread_id().to_string(),
            message: message.to_string(),
            id: id.clone(),
        });
        Ok(id)
    }

    async fn edit(&self, post_id: &str, message: &str) -> parley_chat::Result<()> {
        self.record(Call::Edit {
            post_id: post_id.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn add_reaction(&self, post_id: &str, emoji: &str) -> parley_chat::Result<()> {
        self.record(Call::AddReaction {
            post_id: post_id.to_string(),
            emoji: emoji.to_string(),
        });
        self.reactions
            .lock()
            .unwrap()
            .entry(post_id.to_string())
            .or_default()
            .insert(emoji.to_string());
        Ok(())
    }

    async fn remove_reaction(&self, post_id: &str, emoji: &str) -> parley_chat::Result<()> {
        self.record(Call::RemoveReaction {
            post_id: post_id.to_string(),
            emoji: emoji.to_string(),
        });
        if let Some(set) = self.reactions.lock().unwrap().get_mut(post_id) {
            set.remove(emoji);
        }
        Ok(())
    }
}

/// What the fake provider does when a stream is opened
pub enum Script {
    /// Fragments, each delivered after its delay
    Fragments(Vec<(Duration, String)>),
    /// Fail before producing anything
    FailOpen(ProviderError),
    /// Deliver fragments 1ms apart, then fail mid-stream
    FailAfter(Vec<String>, ProviderError),
    /// Deliver fragments 1ms apart, then never send anything again
    Stall(Vec<String>),
}

pub struct FakeProvider {
    script: Mutex<Option<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(Some(script)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fragments delivered back to back
    pub fn fragments(parts: &[&str]) -> Self {
        Self::new(Script::Fragments(
            parts.iter().map(|p| (Duration::ZERO, p.to_string())).collect(),
        ))
    }

    /// Fragments delivered `gap` apart
    pub fn paced(parts: &[&str], gap: Duration) -> Self {
        Self::new(Script::Fragments(
            parts.iter().map(|p| (gap, p.to_string())).collect(),
        ))
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamingProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn open_stream(&self, request: ChatRequest) -> parley_llm::Result<EventStream> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .script
            .lock()
            .unwrap()
            .take()
            .expect("fake provider opened twice");

        let stalls = matches!(script, Script::Stall(_));
        let items: Vec<(Duration, parley_llm::Result<StreamEvent>)> = match script {
            Script::FailOpen(error) => return Err(error),
            Script::Fragments(parts) => parts
                .into_iter()
                .map(|(delay, text)| (delay, Ok(StreamEvent::message(text))))
                .chain(std::iter::once((Duration::ZERO, Ok(StreamEvent::done()))))
                .collect(),
            Script::FailAfter(parts, error) => parts
                .into_iter()
                .map(|text| (Duration::from_millis(1), Ok(StreamEvent::message(text))))
                .chain(std::iter::once((Duration::ZERO, Err(error))))
                .collect(),
            Script::Stall(parts) => parts
                .into_iter()
                .map(|text| (Duration::from_millis(1), Ok(StreamEvent::message(text))))
                .collect(),
        };

        let events = futures::stream::iter(items).then(|(delay, item)| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            item
        });

        if stalls {
            Ok(events.chain(futures::stream::pending()).boxed())
        } else {
            Ok(events.boxed())
        }
    }
}

pub fn post(id: &str, user: &str, text: &str) -> ChatPost {
    ChatPost::new(id, "channel", user, text).with_sender_name(user)
}

pub fn reply(id: &str, root: &str, user: &str, text: &str) -> ChatPost {
    post(id, user, text).with_root(root)
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub platform: Arc<FakePlatform>,
    pub provider: Arc<FakeProvider>,
    pub handler: TurnHandler,
}

impl Harness {
    pub fn new(platform: FakePlatform, provider: FakeProvider) -> Self {
        Self::with_authorizer(platform, provider, StaticAuthorizer::default())
    }

    pub fn with_authorizer(
        platform: FakePlatform,
        provider: FakeProvider,
        authorizer: StaticAuthorizer,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let platform = Arc::new(platform);
        let provider = Arc::new(provider);
        let handler = TurnHandler::new(
            ProviderKind::ChatGpt,
            provider.clone(),
            store.clone(),
            platform.clone(),
            Arc::new(authorizer),
        );

        Self {
            store,
            platform,
            provider,
            handler,
        }
    }

    pub fn conversations(&self) -> parley_persist::ConversationStore {
        let store: Arc<dyn KeyValueStore> = self.store.clone();
        parley_persist::ConversationStore::for_provider(store, ProviderKind::ChatGpt)
    }
}
