//! Abuse restriction registry.
//!
//! Restrictions are typed flags on an identifier (`login:alice@example.com`,
//! `ip:203.0.113.9`) with an attempt counter and a per-entry TTL. Repeating
//! an offense refreshes the TTL and bumps the counter atomically. Admin
//! endpoints can list by type, lift a single restriction, or clear all.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use moka::{Expiry, sync::Cache};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Restriction {
    pub kind: String,
    pub identifier: String,
    pub attempts: u32,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    expires_in: Duration,
}

struct RestrictionExpiry;

impl Expiry<String, Restriction> for RestrictionExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Restriction,
        _now: Instant,
    ) -> Option<Duration> {
        Some(value.expires_in)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Restriction,
        _now: Instant,
        _duration: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_in)
    }
}

pub struct RestrictionCache {
    cache: Cache<String, Restriction>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    default_ttl: Duration,
}

fn cache_key(kind: &str, identifier: &str) -> String {
    format!("{}:{}", kind, identifier).to_ascii_lowercase()
}

impl RestrictionCache {
    pub fn new(capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .expire_after(RestrictionExpiry)
            .build();
        Self {
            cache,
            locks: DashMap::new(),
            default_ttl,
        }
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Records an offense: creates the restriction at one attempt, or bumps
    /// the counter and refreshes the TTL. Returns the attempt count.
    pub fn add_or_refresh(
        &self,
        kind: &str,
        identifier: &str,
        data: Value,
        ttl: Option<Duration>,
    ) -> u32 {
        let key = cache_key(kind, identifier);
        let lock = self.lock_for(&key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = match self.cache.get(&key) {
            Some(mut existing) => {
                existing.attempts += 1;
                existing.data = data;
                existing.expires_in = ttl;
                existing
            }
            None => Restriction {
                kind: kind.to_ascii_lowercase(),
                identifier: identifier.to_ascii_lowercase(),
                attempts: 1,
                data,
                created_at: Utc::now(),
                expires_in: ttl,
            },
        };

        let attempts = entry.attempts;
        self.cache.insert(key, entry);
        attempts
    }

    pub fn get(&self, kind: &str, identifier: &str) -> Option<Restriction> {
        self.cache.get(&cache_key(kind, identifier))
    }

    pub fn is_restricted(&self, kind: &str, identifier: &str) -> bool {
        self.get(kind, identifier).is_some()
    }

    /// Attempt count for the pair, zero when unrestricted.
    pub fn attempts(&self, kind: &str, identifier: &str) -> u32 {
        self.get(kind, identifier).map(|r| r.attempts).unwrap_or(0)
    }

    /// Lifts a single restriction. Returns whether one existed.
    pub fn remove(&self, kind: &str, identifier: &str) -> bool {
        let key = cache_key(kind, identifier);
        let existed = self.cache.contains_key(&key);
        self.cache.invalidate(&key);
        existed
    }

    /// All live restrictions of one type.
    pub fn list_by_kind(&self, kind: &str) -> Vec<Restriction> {
        let prefix = format!("{}:", kind.to_ascii_lowercase());
        self.cache
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, value)| value)
            .collect()
    }

    /// Drops every restriction. Returns the number dropped.
    pub fn clear_all(&self) -> u64 {
        self.cache.run_pending_tasks();
        let count = self.cache.entry_count();
        self.cache.invalidate_all();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> RestrictionCache {
        RestrictionCache::new(1000, Duration::from_secs(3600))
    }

    #[test]
    fn test_attempt_counter_and_case_folding() {
        let c = cache();

        assert_eq!(c.add_or_refresh("login", "Alice@Example.com", json!({}), None), 1);
        assert_eq!(c.add_or_refresh("Login", "alice@example.COM", json!({}), None), 2);
        assert_eq!(c.attempts("login", "alice@example.com"), 2);
        assert!(c.is_restricted("LOGIN", "ALICE@EXAMPLE.COM"));
        assert!(!c.is_restricted("login", "bob@example.com"));
    }

    #[test]
    fn test_remove_and_clear() {
        let c = cache();
        c.add_or_refresh("login", "a@b.c", json!({}), None);
        c.add_or_refresh("ip", "203.0.113.9", json!({}), None);

        assert!(c.remove("login", "a@b.c"));
        assert!(!c.remove("login", "a@b.c"));
        assert!(c.is_restricted("ip", "203.0.113.9"));

        assert_eq!(c.clear_all(), 1);
        assert!(!c.is_restricted("ip", "203.0.113.9"));
    }

    #[test]
    fn test_list_by_kind() {
        let c = cache();
        c.add_or_refresh("login", "a@b.c", json!({}), None);
        c.add_or_refresh("login", "d@e.f", json!({}), None);
        c.add_or_refresh("ip", "203.0.113.9", json!({}), None);

        let logins = c.list_by_kind("login");
        assert_eq!(logins.len(), 2);
        assert!(logins.iter().all(|r| r.kind == "login"));
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let c = Arc::new(RestrictionCache::new(1000, Duration::from_secs(3600)));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        c.add_or_refresh("login", "a@b.c", json!({}), None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(c.attempts("login", "a@b.c"), 100);
    }

    #[test]
    fn test_custom_ttl_expires() {
        let c = cache();
        c.add_or_refresh(
            "otp",
            "a@b.c",
            json!({}),
            Some(Duration::from_millis(40)),
        );

        assert!(c.is_restricted("otp", "a@b.c"));
        std::thread::sleep(Duration::from_millis(80));
        assert!(!c.is_restricted("otp", "a@b.c"));
    }

    #[test]
    fn test_refresh_extends_ttl() {
        let c = cache();
        c.add_or_refresh("login", "a@b.c", json!({}), Some(Duration::from_millis(60)));

        std::thread::sleep(Duration::from_millis(40));
        c.add_or_refresh("login", "a@b.c", json!({}), Some(Duration::from_millis(60)));

        std::thread::sleep(Duration::from_millis(40));
        // Would have expired under the original deadline.
        assert!(c.is_restricted("login", "a@b.c"));
    }
}
