//! Short-lived in-process cache for upstream responses.
//!
//! Entries live for a fixed 5 minutes and expire lazily: an expired entry is
//! reported as a miss but stays in the map until the next `set` for its key
//! replaces it. There is no eviction beyond TTL, so the map grows with the
//! number of distinct keys for the process lifetime — acceptable because keys
//! are drawn from the small space of (operation, normalized params) pairs,
//! but a known scaling limit if that ever changes.
//!
//! Concurrent misses for the same key are allowed to race: both callers hit
//! upstream and both write, last writer wins. No single-flight de-duplication
//! is attempted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

/// Fixed TTL applied to every entry.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

/// Process-wide response cache, shared across requests via `AppState`.
/// Constructible per instance so tests can run against isolated caches.
#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the payload for `key` if present and not yet expired.
    /// An expired entry is a miss; it is not removed here.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.payload.clone())
    }

    /// Stores `payload` under `key` with the fixed TTL, replacing any prior
    /// entry (expired or not) for that key.
    pub fn set(&self, key: &str, payload: Value) {
        self.insert(key, payload, CACHE_TTL);
    }

    fn insert(&self, key: &str, payload: Value, ttl: Duration) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_then_get_returns_payload() {
        let cache = ResponseCache::new();
        cache.set("k", json!({"ok": true}));
        assert_eq!(cache.get("k"), Some(json!({"ok": true})));
    }

    #[test]
    fn test_missing_key_is_miss() {
        let cache = ResponseCache::new();
        assert_eq!(cache.get("absent"), None);
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let cache = ResponseCache::new();
        cache.insert("k", json!(1), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_set_replaces_expired_entry() {
        let cache = ResponseCache::new();
        cache.insert("k", json!("stale"), Duration::ZERO);
        cache.set("k", json!("fresh"));
        assert_eq!(cache.get("k"), Some(json!("fresh")));
    }

    #[test]
    fn test_last_write_wins() {
        let cache = ResponseCache::new();
        cache.set("k", json!(1));
        cache.set("k", json!(2));
        assert_eq!(cache.get("k"), Some(json!(2)));
    }
}
