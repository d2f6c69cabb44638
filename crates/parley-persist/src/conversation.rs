use parley_llm::{ProviderKind, Turn};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::models::{decode_turn, encode_turn};
use crate::store::KeyValueStore;

/// Threads are forgotten this long after their last write
pub const THREAD_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Per-thread turn history for one provider
///
/// History lives in a list under `{prefix}{thread_id}`. Every write
/// refreshes the retention window.
#[derive(Clone)]
pub struct ConversationStore {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    retention: Duration,
}

impl ConversationStore {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            retention: THREAD_RETENTION,
        }
    }

    /// Store namespaced for a provider, e.g. `chatgpt_thread_<id>`
    pub fn for_provider(store: Arc<dyn KeyValueStore>, kind: ProviderKind) -> Self {
        Self::new(store, format!("{}_thread_", kind.as_str()))
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn key(&self, thread_id: &str) -> String {
        format!("{}{}", self.prefix, thread_id)
    }

    /// Whether this provider already holds history for the thread
    pub async fn exists(&self, thread_id: &str) -> Result<bool> {
        self.store.exists(&self.key(thread_id)).await
    }

    /// All persisted turns, oldest first
    pub async fn load(&self, thread_id: &str) -> Result<Vec<Turn>> {
        self.store
            .list_range(&self.key(thread_id), 0, -1)
            .await?
            .iter()
            .map(|raw| decode_turn(raw))
            .collect()
    }

    /// Append one turn and refresh the retention window
    pub async fn append(&self, thread_id: &str, turn: &Turn) -> Result<()> {
        let key = self.key(thread_id);
        self.store.list_push(&key, encode_turn(turn)?).await?;
        self.store.expire(&key, self.retention).await?;
        Ok(())
    }

    /// Append a user message, merging into the last turn if it is already a user turn
    ///
    /// `history` is the caller's in-memory copy. It is updated before the
    /// store is written, so it stays current even if the write fails.
    pub async fn append_user(&self, thread_id: &str, history: &mut Vec<Turn>, text: &str) -> Result<()> {
        let key = self.key(thread_id);

        let merge = history.last().is_some_and(Turn::is_user);
        if merge {
            if let Some(last) = history.last_mut() {
                last.append_line(text);
            }
        } else {
            history.push(Turn::user(text));
        }

        let Some(last) = history.last() else {
            return Ok(());
        };
        let encoded = encode_turn(last)?;
        if merge {
            self.store.list_set_last(&key, encoded).await?;
        } else {
            self.store.list_push(&key, encoded).await?;
        }

        self.store.expire(&key, self.retention).await?;
        Ok(())
    }

    /// Persist a freshly reconstructed history turn by turn
    pub async fn append_all(&self, thread_id: &str, turns: &[Turn]) -> Result<()> {
        for turn in turns {
            self.append(thread_id, turn).await?;
        }
        Ok(())
    }

    pub async fn clear(&self, thread_id: &str) -> Result<()> {
        self.store.delete(&self.key(thread_id)).await
    }
}
