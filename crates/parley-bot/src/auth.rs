use parley_chat::ChatPost;
use std::collections::HashSet;

/// Decides who may use the bot
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, post: &ChatPost) -> bool;

    /// Admins may change provider settings
    fn is_admin(&self, post: &ChatPost) -> bool;
}

/// Allow and admin lists from configuration, matched on username or user id
///
/// An empty allow list lets everybody in. Admins are always authorized.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    allowed: HashSet<String>,
    admins: HashSet<String>,
}

impl StaticAuthorizer {
    pub fn new<I, J, S, T>(allowed: I, admins: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            allowed: allowed.into_iter().map(|s| normalize(s.as_ref())).collect(),
            admins: admins.into_iter().map(|s| normalize(s.as_ref())).collect(),
        }
    }

    fn matches(set: &HashSet<String>, post: &ChatPost) -> bool {
        set.contains(&normalize(&post.sender_name)) || set.contains(&normalize(&post.user_id))
    }
}

fn normalize(identity: &str) -> String {
    identity.trim().trim_start_matches('@').to_lowercase()
}

impl Authorizer for StaticAuthorizer {
    fn is_authorized(&self, post: &ChatPost) -> bool {
        self.allowed.is_empty() || Self::matches(&self.allowed, post) || self.is_admin(post)
    }

    fn is_admin(&self, post: &ChatPost) -> bool {
        Self::matches(&self.admins, post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_from(user_id: &str, name: &str) -> ChatPost {
        ChatPost::new("p1", "c1", user_id, "hi").with_sender_name(name)
    }

    #[test]
    fn test_empty_allow_list_allows_everyone() {
        let auth = StaticAuthorizer::new(Vec::<String>::new(), vec!["root"]);
        assert!(auth.is_authorized(&post_from("u1", "anyone")));
        assert!(!auth.is_admin(&post_from("u1", "anyone")));
    }

    #[test]
    fn test_allow_list_by_name_or_id() {
        let auth = StaticAuthorizer::new(vec!["@Alice", "u42"], vec!["root"]);

        assert!(auth.is_authorized(&post_from("u1", "alice")));
        assert!(auth.is_authorized(&post_from("u42", "bob")));
        assert!(!auth.is_authorized(&post_from("u2", "mallory")));
        assert!(auth.is_authorized(&post_from("u3", "root")));
    }
}
