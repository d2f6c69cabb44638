use serde::{Deserialize, Serialize};

/// A chat message as the bot sees it
///
/// Built from the raw platform payload so handlers never touch
/// platform-specific structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPost {
    pub id: String,
    /// Thread root; `None` when the post starts a thread
    pub root_id: Option<String>,
    pub channel_id: String,
    pub user_id: String,
    /// Sender's username, without a leading `@`
    pub sender_name: String,
    pub message: String,
    /// Creation time in epoch milliseconds
    pub create_at: i64,
}

impl ChatPost {
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            root_id: None,
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            sender_name: String::new(),
            message: message.into(),
            create_at: 0,
        }
    }

    pub fn with_root(mut self, root_id: impl Into<String>) -> Self {
        let root_id = root_id.into();
        self.root_id = (!root_id.is_empty()).then_some(root_id);
        self
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = name.into().trim_start_matches('@').to_string();
        self
    }

    pub fn with_create_at(mut self, create_at: i64) -> Self {
        self.create_at = create_at;
        self
    }

    /// Conversation identifier: the root post, or this post if it is the root
    pub fn thread_id(&self) -> &str {
        self.root_id.as_deref().unwrap_or(&self.id)
    }

    pub fn is_reply(&self) -> bool {
        self.root_id.is_some()
    }

    pub fn is_from(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Whether the text mentions `@name` as a whole word (case-insensitive)
    pub fn mentions(&self, name: &str) -> bool {
        let needle = format!("@{}", name.trim_start_matches('@')).to_lowercase();
        let text = self.message.to_lowercase();

        text.match_indices(&needle).any(|(idx, _)| {
            let before = text[..idx].chars().next_back();
            let after = text[idx + needle.len()..].chars().next();
            !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char)
        })
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_falls_back_to_own_id() {
        let root = ChatPost::new("p1", "c1", "u1", "hello");
        assert_eq!(root.thread_id(), "p1");
        assert!(!root.is_reply());

        let reply = ChatPost::new("p2", "c1", "u1", "again").with_root("p1");
        assert_eq!(reply.thread_id(), "p1");
        assert!(reply.is_reply());
    }

    #[test]
    fn test_empty_root_is_no_root() {
        let post = ChatPost::new("p1", "c1", "u1", "x").with_root("");
        assert_eq!(post.root_id, None);
    }

    #[test]
    fn test_sender_name_strips_at() {
        let post = ChatPost::new("p1", "c1", "u1", "x").with_sender_name("@alice");
        assert_eq!(post.sender_name, "alice");
    }

    #[test]
    fn test_mentions_whole_word() {
        let post = ChatPost::new("p1", "c1", "u1", "hey @GPT what is rust?");
        assert!(post.mentions("gpt"));
        assert!(post.mentions("@gpt"));
        assert!(!post.mentions("claude"));

        let partial = ChatPost::new("p1", "c1", "u1", "ping @gpt4 and mail a@gpt");
        assert!(!partial.mentions("gpt"));

        let trailing = ChatPost::new("p1", "c1", "u1", "thoughts, @grok?");
        assert!(trailing.mentions("grok"));
    }
}
