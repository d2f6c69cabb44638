use parley_chat::ChatPost;
use parley_llm::{merge_user_turns, Turn};

/// Rebuild a conversation from the raw posts of a thread
///
/// Posts by the bot become assistant turns (with the reply prefix
/// stripped), everything else becomes a user turn. Empty posts are
/// skipped and consecutive user turns are merged. The result depends only
/// on the posts, so rebuilding the same thread twice gives the same turns.
pub fn reconstruct_turns(posts: &[ChatPost], bot_user_id: &str, reply_prefix: &str) -> Vec<Turn> {
    let turns = posts
        .iter()
        .filter_map(|post| {
            if post.is_from(bot_user_id) {
                let content = post.message.strip_prefix(reply_prefix).unwrap_or(&post.message);
                let content = content.trim();
                (!content.is_empty()).then(|| Turn::assistant(content))
            } else {
                let content = post.message.trim();
                (!content.is_empty()).then(|| Turn::user(content))
            }
        })
        .collect();

    merge_user_turns(turns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_llm::Role;

    fn post(id: &str, user: &str, text: &str) -> ChatPost {
        ChatPost::new(id, "c1", user, text).with_root("root")
    }

    #[test]
    fn test_user_assistant_user() {
        let posts = vec![
            post("1", "alice", "@gpt what is rust?"),
            post("2", "bot", "A language."),
            post("3", "alice", "tell me more"),
        ];

        let turns = reconstruct_turns(&posts, "bot", "");
        let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();

        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(turns[1].content, "A language.");
    }

    #[test]
    fn test_consecutive_users_merged() {
        let posts = vec![
            post("1", "alice", "first"),
            post("2", "bob", "second"),
            post("3", "bot", "answer"),
        ];

        let turns = reconstruct_turns(&posts, "bot", "");

        assert_eq!(
            turns,
            vec![Turn::user("first\nsecond"), Turn::assistant("answer")]
        );
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let posts = vec![
            post("1", "alice", "a"),
            post("2", "alice", "b"),
            post("3", "bot", "c"),
            post("4", "bob", "d"),
        ];

        assert_eq!(
            reconstruct_turns(&posts, "bot", ""),
            reconstruct_turns(&posts, "bot", "")
        );
    }

    #[test]
    fn test_prefix_stripped_and_empty_posts_skipped() {
        let posts = vec![
            post("1", "alice", "hi"),
            post("2", "bot", ""),
            post("3", "alice", "anyone?"),
            post("4", "bot", "GPT: \n# Hello"),
        ];

        let turns = reconstruct_turns(&posts, "bot", "GPT: ");

        assert_eq!(
            turns,
            vec![Turn::user("hi\nanyone?"), Turn::assistant("# Hello")]
        );
    }
}
