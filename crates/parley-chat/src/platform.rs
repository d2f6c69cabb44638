use async_trait::async_trait;

use crate::error::Result;
use crate::post::ChatPost;

/// Operations the bot needs from a chat platform
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// User id the bot posts as
    fn bot_user_id(&self) -> &str;

    /// Every post in a thread, oldest first
    async fn get_thread(&self, thread_id: &str) -> Result<Vec<ChatPost>>;

    /// Post a reply in the thread of `to`, returning the new post id
    async fn reply(&self, to: &ChatPost, message: &str) -> Result<String>;

    /// Replace the text of an existing post
    async fn edit(&self, post_id: &str, message: &str) -> Result<()>;

    async fn add_reaction(&self, post_id: &str, emoji: &str) -> Result<()>;

    async fn remove_reaction(&self, post_id: &str, emoji: &str) -> Result<()>;
}
