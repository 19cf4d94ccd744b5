use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

#[cfg(not(test))]
use std::time::Instant;
#[cfg(test)]
use mock_instant::Instant;

/// Injected key-value store with per-entry TTL. Callers own the instance
/// and pass it where needed; there is no process-global cache.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: String, ttl: Duration);
    async fn invalidate(&self, key: &str);
}

/// Cache key under which a practitioner's working-schedule rows are stored.
/// Writers of schedule rows invalidate this key; the slot query path reads it.
pub fn schedule_cache_key(practitioner_id: &str) -> String {
    format!("schedules:{}", practitioner_id)
}

struct Entry {
    value: String,
    expires_at: Instant,
}

pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueCache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                debug!("Cache entry expired: {}", key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        // Expired entries are swept on writes so reads stay lock-light.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_instant::MockClock;

    // Generous TTLs where expiry is not under test: the mock clock is
    // shared between tests, so unrelated advances must not expire entries.
    #[tokio::test]
    async fn returns_value_before_expiry() {
        let cache = InMemoryCache::new();
        cache.put("k", "v".to_string(), Duration::from_secs(86_400)).await;

        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = InMemoryCache::new();
        cache.put("k", "v".to_string(), Duration::from_secs(60)).await;

        MockClock::advance(Duration::from_secs(61));
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = InMemoryCache::new();
        cache.put("k", "v".to_string(), Duration::from_secs(86_400)).await;

        cache.invalidate("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn put_sweeps_expired_entries() {
        let cache = InMemoryCache::new();
        cache.put("old", "v".to_string(), Duration::from_secs(10)).await;

        MockClock::advance(Duration::from_secs(11));
        cache.put("new", "v".to_string(), Duration::from_secs(10)).await;

        let entries = cache.entries.read().await;
        assert!(!entries.contains_key("old"));
        assert!(entries.contains_key("new"));
    }
}
