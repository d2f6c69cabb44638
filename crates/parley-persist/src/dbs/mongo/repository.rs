use bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use std::time::Duration;

use crate::dbs::mongo::models::MongoEntry;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoEntryRepository {
    collection: Collection<MongoEntry>,
}

impl MongoEntryRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("kv_entries");
        Self { collection }
    }

    /// TTL index so MongoDB reaps expired keys on its own
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(
                IndexOptions::builder()
                    .expire_after(Duration::from_secs(0))
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// The TTL monitor runs about once a minute, so reads filter expiry themselves
    fn live_filter(key: &str) -> Document {
        doc! {
            "_id": key,
            "$or": [
                { "expires_at": null },
                { "expires_at": { "$gt": BsonDateTime::now() } },
            ]
        }
    }

    /// Remove the document if it has expired but not been reaped yet
    async fn purge_expired(&self, key: &str) -> Result<()> {
        self.collection
            .delete_one(doc! { "_id": key, "expires_at": { "$lte": BsonDateTime::now() } })
            .await?;
        Ok(())
    }

    pub async fn find(&self, key: &str) -> Result<Option<MongoEntry>> {
        Ok(self.collection.find_one(Self::live_filter(key)).await?)
    }

    pub async fn push(&self, key: &str, value: String) -> Result<()> {
        self.purge_expired(key).await?;
        self.collection
            .update_one(doc! { "_id": key }, doc! { "$push": { "list": value } })
            .upsert(true)
            .await?;
        Ok(())
    }

    pub async fn set_last(&self, key: &str, value: String) -> Result<()> {
        let Some(entry) = self.find(key).await? else {
            return Ok(());
        };
        let Some(last_index) = entry.list.len().checked_sub(1) else {
            return Ok(());
        };

        let field = format!("list.{}", last_index);
        self.collection
            .update_one(doc! { "_id": key }, doc! { "$set": { field: value } })
            .await?;
        Ok(())
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let expires_at = BsonDateTime::from_millis(
            chrono::Utc::now().timestamp_millis() + ttl.as_millis() as i64,
        );
        let result = self
            .collection
            .update_one(Self::live_filter(key), doc! { "$set": { "expires_at": expires_at } })
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.collection.delete_one(doc! { "_id": key }).await?;
        Ok(())
    }

    pub async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()> {
        self.purge_expired(key).await?;
        let path = format!("hash.{}", field);
        self.collection
            .update_one(doc! { "_id": key }, doc! { "$set": { path: value } })
            .upsert(true)
            .await?;
        Ok(())
    }

    pub async fn hash_delete(&self, key: &str, field: &str) -> Result<bool> {
        let path = format!("hash.{}", field);
        let result = self
            .collection
            .update_one(Self::live_filter(key), doc! { "$unset": { path: "" } })
            .await?;
        Ok(result.modified_count > 0)
    }
}
