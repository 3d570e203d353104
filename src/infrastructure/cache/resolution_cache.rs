//! Short id → destination cache in front of the database.
//!
//! Bounded, TTL-evicted, write-through on create and invalidated on delete.
//! The cache is an injectable component so tests can swap capacity and TTL.

use moka::sync::Cache;
use std::time::Duration;

#[derive(Clone)]
pub struct ResolutionCache {
    cache: Cache<String, String>,
}

impl ResolutionCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    pub fn get(&self, short: &str) -> Option<String> {
        self.cache.get(short)
    }

    pub fn insert(&self, short: &str, full_url: &str) {
        self.cache.insert(short.to_string(), full_url.to_string());
    }

    pub fn invalidate(&self, short: &str) {
        self.cache.invalidate(short);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_through_and_invalidate() {
        let cache = ResolutionCache::new(100, Duration::from_secs(60));

        cache.insert("Ab3Cd9Ef", "https://example.com");
        assert_eq!(
            cache.get("Ab3Cd9Ef").as_deref(),
            Some("https://example.com")
        );

        cache.invalidate("Ab3Cd9Ef");
        assert_eq!(cache.get("Ab3Cd9Ef"), None);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = ResolutionCache::new(100, Duration::from_millis(50));
        cache.insert("short1", "https://example.com");

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get("short1"), None);
    }
}
