use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::store::{resolve_range, KeyValueStore};

#[derive(Debug, Clone)]
enum Value {
    List(Vec<String>),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// Process-local store, used when no database is configured and in tests
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the entry if its TTL has passed, then hand back a mutable view
    fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        if entries.get(key).map_or(false, |e| e.is_expired(Utc::now())) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    fn wrong_type(key: &str) -> PersistError {
        PersistError::Internal(format!("Key {} holds the wrong kind of value", key))
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn list_push(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        match Self::live_entry(&mut entries, key) {
            Some(Entry { value: Value::List(list), .. }) => list.push(value),
            Some(_) => return Err(Self::wrong_type(key)),
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::List(vec![value]),
                        expires_at: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        match Self::live_entry(&mut entries, key) {
            Some(Entry { value: Value::List(list), .. }) => Ok(resolve_range(list.len(), start, stop)
                .map(|range| list[range].to_vec())
                .unwrap_or_default()),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn list_set_last(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        match Self::live_entry(&mut entries, key) {
            Some(Entry { value: Value::List(list), .. }) => {
                if let Some(last) = list.last_mut() {
                    *last = value;
                }
                Ok(())
            }
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(Self::live_entry(&mut entries, key).is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| PersistError::Internal(format!("Invalid TTL: {}", e)))?;

        match Self::live_entry(&mut entries, key) {
            Some(entry) => {
                entry.expires_at = Some(Utc::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        match Self::live_entry(&mut entries, key) {
            Some(Entry { value: Value::Hash(hash), .. }) => Ok(hash.get(field).cloned()),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        match Self::live_entry(&mut entries, key) {
            Some(Entry { value: Value::Hash(hash), .. }) => {
                hash.insert(field.to_string(), value);
            }
            Some(_) => return Err(Self::wrong_type(key)),
            None => {
                let mut hash = HashMap::new();
                hash.insert(field.to_string(), value);
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Hash(hash),
                        expires_at: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match Self::live_entry(&mut entries, key) {
            Some(Entry { value: Value::Hash(hash), .. }) => Ok(hash.remove(field).is_some()),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(false),
        }
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut entries = self.entries.write().await;
        match Self::live_entry(&mut entries, key) {
            Some(Entry { value: Value::Hash(hash), .. }) => Ok(hash.clone()),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(HashMap::new()),
        }
    }
}
