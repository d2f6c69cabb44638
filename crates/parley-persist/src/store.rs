use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// Minimal key-value contract the bot needs from its backing store
///
/// Lists hold serialized turns per thread, hashes hold per-provider
/// settings. Semantics follow Redis: missing keys read as empty, range
/// bounds are inclusive and may be negative (counted from the end).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Append a value to the list at `key`, creating it if needed
    async fn list_push(&self, key: &str, value: String) -> Result<()>;

    /// Read `[start, stop]` of the list at `key`
    async fn list_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Overwrite the last element of the list; no-op on a missing/empty list
    async fn list_set_last(&self, key: &str, value: String) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Set a time-to-live on `key`. Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>>;

    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()>;

    /// Returns true if the field existed
    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool>;

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>>;
}

/// Resolve Redis-style inclusive range bounds against a list length
///
/// Returns a half-open `start..end` slice range, or None when empty.
pub fn resolve_range(len: usize, start: isize, stop: isize) -> Option<std::ops::Range<usize>> {
    if len == 0 {
        return None;
    }
    let len_i = len as isize;
    let norm = |i: isize| if i < 0 { len_i + i } else { i };

    let start = norm(start).max(0);
    let stop = norm(stop).min(len_i - 1);

    if start > stop || start >= len_i {
        return None;
    }
    Some(start as usize..(stop as usize + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_range() {
        assert_eq!(resolve_range(3, 0, -1), Some(0..3));
    }

    #[test]
    fn test_negative_tail() {
        assert_eq!(resolve_range(5, -2, -1), Some(3..5));
    }

    #[test]
    fn test_out_of_bounds_clamped() {
        assert_eq!(resolve_range(2, 0, 10), Some(0..2));
        assert_eq!(resolve_range(2, -10, 0), Some(0..1));
    }

    #[test]
    fn test_empty_ranges() {
        assert_eq!(resolve_range(0, 0, -1), None);
        assert_eq!(resolve_range(3, 2, 1), None);
        assert_eq!(resolve_range(3, 5, 8), None);
    }
}
