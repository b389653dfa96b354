//! TTL-keyed cache of rendered HTML.
//!
//! Keys are the exact request URL strings, no normalization. Entries expire
//! lazily on read and are also removed by a periodic sweep; the sweep is
//! housekeeping, not a correctness bound. A read never refreshes the TTL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry {
    html: String,
    expires_at: Instant,
}

/// Shared in-memory render cache. Writes are independent per key,
/// last-write-wins.
pub struct RenderCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl RenderCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a cached render. Expired entries count as misses and are
    /// evicted on the spot.
    pub fn get(&self, url: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(url) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.html.clone()),
            Some(_) => {
                entries.remove(url);
                None
            }
            None => None,
        }
    }

    /// Insert a render, stamping its expiry from the configured TTL. The
    /// caller is responsible for only persisting valid outcomes.
    pub fn set(&self, url: &str, html: String) {
        let entry = CacheEntry {
            html,
            expires_at: Instant::now() + self.ttl,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(url.to_string(), entry);
    }

    /// Drop every expired entry.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "cache sweep");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Spawn the periodic sweeper. The handle is dropped at shutdown; no
/// teardown beyond process exit is needed.
pub fn spawn_sweeper(cache: Arc<RenderCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so sweeps start one
        // interval in.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cache.sweep();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn get_returns_value_until_ttl_elapses() {
        let cache = RenderCache::new(Duration::from_secs(300));
        cache.set("http://example.com/a", "<html>a</html>".to_string());

        assert_eq!(
            cache.get("http://example.com/a").as_deref(),
            Some("<html>a</html>")
        );

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("http://example.com/a").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("http://example.com/a").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn read_does_not_refresh_ttl() {
        let cache = RenderCache::new(Duration::from_secs(10));
        cache.set("http://example.com/", "<html></html>".to_string());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get("http://example.com/").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("http://example.com/").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn set_overwrites_existing_entry() {
        let cache = RenderCache::new(Duration::from_secs(60));
        cache.set("http://example.com/", "old".to_string());
        cache.set("http://example.com/", "new".to_string());

        assert_eq!(cache.get("http://example.com/").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_exact_strings() {
        let cache = RenderCache::new(Duration::from_secs(60));
        cache.set("http://example.com/a", "a".to_string());

        // No normalization: trailing slash is a different key.
        assert!(cache.get("http://example.com/a/").is_none());
        assert!(cache.get("HTTP://example.com/a").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_entries() {
        let cache = RenderCache::new(Duration::from_secs(100));
        cache.set("http://example.com/old", "old".to_string());

        tokio::time::advance(Duration::from_secs(60)).await;
        cache.set("http://example.com/fresh", "fresh".to_string());

        tokio::time::advance(Duration::from_secs(50)).await;
        cache.sweep();

        assert_eq!(cache.len(), 1);
        assert!(cache.get("http://example.com/fresh").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_evicts_in_background() {
        let cache = Arc::new(RenderCache::new(Duration::from_secs(5)));
        cache.set("http://example.com/", "x".to_string());

        let handle = spawn_sweeper(Arc::clone(&cache), Duration::from_secs(10));
        // Let the sweeper arm its first tick before moving the clock.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;

        assert!(cache.is_empty());
        handle.abort();
    }
}
