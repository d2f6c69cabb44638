use async_trait::async_trait;
use mongodb::Client;
use std::collections::HashMap;
use std::time::Duration;

use crate::dbs::mongo::repository::MongoEntryRepository;
use crate::error::{PersistError, Result};
use crate::store::{resolve_range, KeyValueStore};

/// MongoDB-backed key-value store
pub struct MongoStore {
    entries: MongoEntryRepository,
}

impl MongoStore {
    /// Connect to MongoDB and make sure the TTL index exists
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let entries = MongoEntryRepository::new(&client, database);
        entries.ensure_indexes().await?;

        tracing::info!(database = %database, "MongoDB store ready");
        Ok(Self { entries })
    }
}

#[async_trait]
impl KeyValueStore for MongoStore {
    async fn list_push(&self, key: &str, value: String) -> Result<()> {
        self.entries.push(key, value).await
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let Some(entry) = self.entries.find(key).await? else {
            return Ok(Vec::new());
        };
        Ok(resolve_range(entry.list.len(), start, stop)
            .map(|range| entry.list[range].to_vec())
            .unwrap_or_default())
    }

    async fn list_set_last(&self, key: &str, value: String) -> Result<()> {
        self.entries.set_last(key, value).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entries.find(key).await?.is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.entries.expire(key, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.delete(key).await
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .find(key)
            .await?
            .and_then(|mut entry| entry.hash.remove(field)))
    }

    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()> {
        self.entries.hash_set(key, field, value).await
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool> {
        self.entries.hash_delete(key, field).await
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self
            .entries
            .find(key)
            .await?
            .map(|entry| entry.hash)
            .unwrap_or_default())
    }
}
