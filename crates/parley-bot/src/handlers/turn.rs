use futures::StreamExt;
use parley_chat::{ChatPlatform, ChatPost};
use parley_llm::{
    with_system_prompt, ChatOptions, ChatRequest, ProviderError, ProviderKind, StreamEvent,
    StreamingProvider, Turn,
};
use parley_persist::{ConversationStore, KeyValueStore, ProviderSettings, SettingsStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::auth::Authorizer;
use crate::history::reconstruct_turns;
use crate::markdown::ReplyBuffer;
use crate::throttle::EditThrottle;

/// Reaction shown on the triggering post while an answer is streaming
pub const IN_PROGRESS_REACTION: &str = "hourglass_flowing_sand";
/// Reaction left on the triggering post when the turn failed
pub const FAILURE_REACTION: &str = "x";
/// Longest wait for the next stream event before the turn fails
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Prior turns of a thread and where they came from
enum History {
    Cached(Vec<Turn>),
    /// `captured` is set when the platform listing already held the trigger
    Rebuilt { turns: Vec<Turn>, captured: bool },
    /// The platform fetch failed; nothing is written for this thread
    Unavailable,
}

/// A failed provider call plus what the user was looking at when it failed
struct StreamFailure {
    shown: String,
    error: ProviderError,
}

/// Runs one streamed question/answer exchange for a single provider
pub struct TurnHandler {
    kind: ProviderKind,
    provider: Arc<dyn StreamingProvider>,
    conversations: ConversationStore,
    settings: SettingsStore,
    platform: Arc<dyn ChatPlatform>,
    authorizer: Arc<dyn Authorizer>,
    reply_prefix: String,
    command_prefix: String,
    idle_timeout: Duration,
}

impl TurnHandler {
    pub fn new(
        kind: ProviderKind,
        provider: Arc<dyn StreamingProvider>,
        store: Arc<dyn KeyValueStore>,
        platform: Arc<dyn ChatPlatform>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            kind,
            provider,
            conversations: ConversationStore::for_provider(store.clone(), kind),
            settings: SettingsStore::new(store),
            platform,
            authorizer,
            reply_prefix: String::new(),
            command_prefix: "!".to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_reply_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reply_prefix = prefix.into();
        self
    }

    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Replace the conversation store (custom retention, tests)
    pub fn with_conversations(mut self, conversations: ConversationStore) -> Self {
        self.conversations = conversations;
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Whether this provider already holds history for the thread
    pub async fn owns_thread(&self, thread_id: &str) -> bool {
        match self.conversations.exists(thread_id).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(provider = %self.kind, thread_id = %thread_id, error = %e, "Failed to check thread ownership");
                false
            }
        }
    }

    /// Handle a post addressed to this provider, with settings loaded from the store
    ///
    /// Never fails: every error ends up in the log and, where the user
    /// should see it, in the reply.
    pub async fn handle(&self, post: &ChatPost) {
        let settings = match self.settings.load(self.kind).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(provider = %self.kind, error = %e, "Failed to load settings, using defaults");
                ProviderSettings::defaults(self.kind)
            }
        };

        self.handle_with_settings(post, &settings).await;
    }

    pub async fn handle_with_settings(&self, post: &ChatPost, settings: &ProviderSettings) {
        if !self.authorizer.is_authorized(post) {
            debug!(sender = %post.sender_name, user_id = %post.user_id, "Ignoring unauthorized sender");
            return;
        }
        if post.message.trim_start().starts_with(&self.command_prefix) {
            return;
        }

        let (history, persist) = match self.resolve_history(post).await {
            History::Cached(mut turns) | History::Rebuilt { mut turns, captured: false } => {
                self.append_user(post, &mut turns).await;
                (turns, true)
            }
            History::Rebuilt { turns, captured: true } => (turns, true),
            // Nothing is written, so the next turn rebuilds the thread
            History::Unavailable => (vec![Turn::user(post.message.trim())], false),
        };

        self.run_turn(post, history, persist, settings).await;
    }

    async fn append_user(&self, post: &ChatPost, history: &mut Vec<Turn>) {
        let thread_id = post.thread_id();
        if let Err(e) = self
            .conversations
            .append_user(thread_id, history, post.message.trim())
            .await
        {
            warn!(provider = %self.kind, thread_id = %thread_id, error = %e, "Failed to persist user turn");
        }
    }

    /// Cached history is used as is. Otherwise the thread is rebuilt from
    /// the platform and written to the store.
    async fn resolve_history(&self, post: &ChatPost) -> History {
        let thread_id = post.thread_id();

        match self.conversations.exists(thread_id).await {
            Ok(true) => match self.conversations.load(thread_id).await {
                Ok(turns) => return History::Cached(turns),
                Err(e) => {
                    warn!(provider = %self.kind, thread_id = %thread_id, error = %e, "Failed to load cached history");
                }
            },
            Ok(false) => {}
            Err(e) => {
                warn!(provider = %self.kind, thread_id = %thread_id, error = %e, "Failed to check cached history");
            }
        }

        let posts = match self.platform.get_thread(thread_id).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(thread_id = %thread_id, error = %e, "Failed to fetch thread from platform, answering without history");
                return History::Unavailable;
            }
        };

        let captured = posts.iter().any(|p| p.id == post.id);
        let turns = reconstruct_turns(&posts, self.platform.bot_user_id(), &self.reply_prefix);
        debug!(provider = %self.kind, thread_id = %thread_id, turns = turns.len(), "Rebuilt history from platform");

        if let Err(e) = self.conversations.append_all(thread_id, &turns).await {
            warn!(provider = %self.kind, thread_id = %thread_id, error = %e, "Failed to persist rebuilt history");
        }

        History::Rebuilt { turns, captured }
    }

    async fn run_turn(
        &self,
        post: &ChatPost,
        history: Vec<Turn>,
        persist: bool,
        settings: &ProviderSettings,
    ) {
        let thread_id = post.thread_id();

        if let Err(e) = self.platform.add_reaction(&post.id, IN_PROGRESS_REACTION).await {
            warn!(post_id = %post.id, error = %e, "Failed to add in-progress reaction");
        }

        let reply_id = match self.platform.reply(post, "").await {
            Ok(id) => id,
            Err(e) => {
                error!(provider = %self.kind, thread_id = %thread_id, error = %e, "Failed to post reply");
                self.mark_failed(post).await;
                return;
            }
        };

        let request = ChatRequest::new(settings.model.clone(), with_system_prompt(&settings.system, history))
            .with_options(
                ChatOptions::new()
                    .temperature(settings.temperature)
                    .top_p(settings.top_p),
            );

        match self.stream_reply(&reply_id, request, settings).await {
            Ok(answer) => {
                if !persist {
                    debug!(provider = %self.kind, thread_id = %thread_id, "Thread history unavailable, answer not stored");
                } else if let Err(e) = self
                    .conversations
                    .append(thread_id, &Turn::assistant(answer))
                    .await
                {
                    warn!(provider = %self.kind, thread_id = %thread_id, error = %e, "Failed to persist assistant turn");
                }
                self.clear_in_progress(post).await;

                info!(
                    provider = %self.kind,
                    sender = %post.sender_name,
                    model = %settings.model,
                    thread_id = %thread_id,
                    "Answered"
                );
            }
            Err(failure) => self.report_failure(post, &reply_id, failure, settings).await,
        }
    }

    /// Stream the answer into the reply, returning the full text on success
    async fn stream_reply(
        &self,
        reply_id: &str,
        request: ChatRequest,
        settings: &ProviderSettings,
    ) -> Result<String, StreamFailure> {
        let mut stream = self
            .provider
            .open_stream(request)
            .await
            .map_err(|error| StreamFailure {
                shown: String::new(),
                error,
            })?;

        let mut reply = ReplyBuffer::new(self.reply_prefix.as_str());
        let mut throttle = if settings.stream {
            EditThrottle::new(settings.update_delay())
        } else {
            EditThrottle::disabled()
        };
        let mut shown = String::new();

        loop {
            let event = match tokio::time::timeout(self.idle_timeout, stream.next()).await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(_) => Err(ProviderError::Timeout(format!(
                    "no response from provider for {}s",
                    self.idle_timeout.as_secs()
                ))),
            };

            match event {
                Ok(StreamEvent::Message { content }) => {
                    if content.is_empty() {
                        continue;
                    }
                    reply.push(&content);

                    if throttle.ready() {
                        let rendered = reply.render();
                        match self.platform.edit(reply_id, &rendered).await {
                            Ok(()) => shown = rendered,
                            Err(e) => warn!(reply_id = %reply_id, error = %e, "Failed to update reply"),
                        }
                    }
                }
                Ok(StreamEvent::Done { finish_reason }) => {
                    debug!(provider = %self.kind, finish_reason = ?finish_reason, "Stream finished");
                    break;
                }
                Err(error) => return Err(StreamFailure { shown, error }),
            }
        }

        if let Err(e) = self.platform.edit(reply_id, &reply.render()).await {
            warn!(reply_id = %reply_id, error = %e, "Failed to write final reply");
        }

        Ok(reply.into_text())
    }

    async fn report_failure(
        &self,
        post: &ChatPost,
        reply_id: &str,
        failure: StreamFailure,
        settings: &ProviderSettings,
    ) {
        let kind = self.provider.classify_error(&failure.error);
        error!(
            provider = %self.kind,
            model = %settings.model,
            thread_id = %post.thread_id(),
            kind = ?kind,
            error = %failure.error,
            "Completion failed"
        );

        let message = if failure.shown.is_empty() {
            failure.error.to_string()
        } else {
            format!("{}\n{}", failure.shown, failure.error)
        };
        if let Err(e) = self.platform.edit(reply_id, &message).await {
            warn!(reply_id = %reply_id, error = %e, "Failed to show error in reply");
        }

        self.mark_failed(post).await;
    }

    async fn clear_in_progress(&self, post: &ChatPost) {
        if let Err(e) = self.platform.remove_reaction(&post.id, IN_PROGRESS_REACTION).await {
            warn!(post_id = %post.id, error = %e, "Failed to remove in-progress reaction");
        }
    }

    async fn mark_failed(&self, post: &ChatPost) {
        self.clear_in_progress(post).await;
        if let Err(e) = self.platform.add_reaction(&post.id, FAILURE_REACTION).await {
            warn!(post_id = %post.id, error = %e, "Failed to add failure reaction");
        }
    }
}
