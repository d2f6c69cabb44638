use bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One key of the key-value store as a MongoDB document
///
/// A key holds either a list or a hash; the unused field stays empty.
/// `expires_at` is covered by a TTL index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEntry {
    #[serde(rename = "_id")]
    pub key: String,
    #[serde(default)]
    pub list: Vec<String>,
    #[serde(default)]
    pub hash: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<BsonDateTime>,
}
