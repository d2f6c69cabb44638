use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::post::ChatPost;

#[derive(Debug, Clone, Deserialize)]
pub struct MmUser {
    pub id: String,
    pub username: String,
}

/// Post as returned by the REST API and embedded in `posted` events
#[derive(Debug, Clone, Deserialize)]
pub struct MmPost {
    pub id: String,
    #[serde(default)]
    pub create_at: i64,
    pub user_id: String,
    pub channel_id: String,
    #[serde(default)]
    pub root_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub props: Value,
}

impl MmPost {
    pub fn into_chat_post(self, sender_name: Option<&str>) -> ChatPost {
        let mut post = ChatPost::new(self.id, self.channel_id, self.user_id, self.message)
            .with_root(self.root_id)
            .with_create_at(self.create_at);
        if let Some(name) = sender_name {
            post = post.with_sender_name(name);
        }
        post
    }
}

/// `GET /posts/{id}/thread`
#[derive(Debug, Clone, Deserialize)]
pub struct MmPostList {
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub posts: HashMap<String, MmPost>,
}

impl MmPostList {
    /// Posts sorted by creation time, oldest first
    pub fn into_sorted(self) -> Vec<MmPost> {
        let mut posts: Vec<MmPost> = self.posts.into_values().collect();
        posts.sort_by(|a, b| a.create_at.cmp(&b.create_at).then_with(|| a.id.cmp(&b.id)));
        posts
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatePost<'a> {
    pub channel_id: &'a str,
    pub message: &'a str,
    pub root_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PatchPost<'a> {
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewReaction<'a> {
    pub user_id: &'a str,
    pub post_id: &'a str,
    pub emoji_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

/// WebSocket event frame
#[derive(Debug, Clone, Deserialize)]
pub struct WsEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub seq: i64,
}
