use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::fetcher::ConditionalHeaders;
use crate::model::Feed;

/// A parsed feed plus the validators needed to revalidate it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub feed: Feed,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn conditional_headers(&self) -> ConditionalHeaders {
        ConditionalHeaders {
            etag: self.etag.clone(),
            last_modified: self.last_modified.clone(),
        }
    }
}

/// Count and list of cached URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    /// Cached URLs, sorted
    pub urls: Vec<String>,
}

/// URL-keyed store of [`CacheEntry`] values.
///
/// Keys are the literal request URL with no normalization. Entries never
/// expire; they are replaced by the next successful parse or dropped by
/// [`clear`](Self::clear).
///
/// Cloning yields a handle to the same store, so several parsers may share
/// one. Concurrent writes for the same URL are not coordinated: the last
/// `put` wins.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        self.read().get(url).cloned()
    }

    /// Stores `entry` under `url`, replacing any previous entry wholesale.
    pub fn put(&self, url: &str, entry: CacheEntry) {
        let previous = self.write().insert(url.to_string(), entry);
        tracing::debug!(url = %url, replaced = previous.is_some(), "Cached feed");
    }

    pub fn clear(&self) {
        let mut entries = self.write();
        let evicted = entries.len();
        entries.clear();
        tracing::debug!(evicted = evicted, "Cleared feed cache");
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.read();
        let mut urls: Vec<String> = entries.keys().cloned().collect();
        urls.sort();
        CacheStats {
            size: urls.len(),
            urls,
        }
    }

    // A panic while holding the lock cannot leave a half-written HashMap
    // entry behind, so poisoned guards are safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, title: &str, etag: Option<&str>) -> CacheEntry {
        CacheEntry {
            url: url.to_string(),
            etag: etag.map(str::to_string),
            last_modified: None,
            feed: Feed {
                title: Some(title.to_string()),
                url: url.to_string(),
                ..Default::default()
            },
            cached_at: Utc::now(),
        }
    }

    #[test]
    fn test_get_missing_returns_none() {
        let cache = CacheStore::new();
        assert!(cache.get("https://example.com/feed").is_none());
    }

    #[test]
    fn test_put_then_get() {
        let cache = CacheStore::new();
        cache.put("https://a.example/feed", entry("https://a.example/feed", "A", Some("\"1\"")));

        let hit = cache.get("https://a.example/feed").unwrap();
        assert_eq!(hit.feed.title.as_deref(), Some("A"));
        assert_eq!(hit.etag.as_deref(), Some("\"1\""));
    }

    #[test]
    fn test_put_overwrites_without_merge() {
        let cache = CacheStore::new();
        let url = "https://a.example/feed";
        cache.put(url, entry(url, "Old", Some("\"1\"")));
        cache.put(url, entry(url, "New", None));

        let hit = cache.get(url).unwrap();
        assert_eq!(hit.feed.title.as_deref(), Some("New"));
        assert!(hit.etag.is_none());
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn test_keys_are_not_normalized() {
        let cache = CacheStore::new();
        cache.put("https://a.example/feed", entry("https://a.example/feed", "A", None));
        assert!(cache.get("https://a.example/feed/").is_none());
        assert!(cache.get("HTTPS://a.example/feed").is_none());
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = CacheStore::new();
        cache.put("https://b.example/feed", entry("https://b.example/feed", "B", None));
        cache.put("https://a.example/feed", entry("https://a.example/feed", "A", None));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(
            stats.urls,
            vec!["https://a.example/feed", "https://b.example/feed"]
        );

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = CacheStore::new();
        let shared = cache.clone();
        shared.put("https://a.example/feed", entry("https://a.example/feed", "A", None));
        assert!(cache.get("https://a.example/feed").is_some());
    }

    #[test]
    fn test_conditional_headers_from_entry() {
        let mut e = entry("https://a.example/feed", "A", Some("\"abc\""));
        e.last_modified = Some("Mon, 01 Jan 2024 00:00:00 GMT".into());
        let headers = e.conditional_headers();
        assert_eq!(headers.etag.as_deref(), Some("\"abc\""));
        assert_eq!(
            headers.last_modified.as_deref(),
            Some("Mon, 01 Jan 2024 00:00:00 GMT")
        );
    }
}
