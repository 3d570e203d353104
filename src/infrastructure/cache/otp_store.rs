//! One-time-code store for email verification flows.
//!
//! A code lives for a bounded TTL and allows three verification attempts.
//! Exhausting the attempts keeps a tombstone entry around for the cooldown
//! window so a fresh code cannot be requested immediately. Every
//! read-modify-write goes through a per-key lock; the cache itself only
//! ever sees whole-entry inserts, so counters cannot be lost to races.

use dashmap::DashMap;
use moka::{Expiry, sync::Cache};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAX_ATTEMPTS: u32 = 3;
const HISTORY_LIMIT: usize = 5;

#[derive(Debug, Clone)]
struct OtpEntry {
    /// None once the attempts are exhausted; the entry then only serves
    /// as a cooldown tombstone.
    code: Option<String>,
    payload: Value,
    attempts: u32,
    /// How many codes were issued under this key.
    request_count: u32,
    last_request: Instant,
    /// Most recent verification attempts, oldest dropped past the limit.
    history: Vec<String>,
    /// Per-entry lifetime, read by the cache's expiry policy.
    expires_in: Duration,
}

struct OtpExpiry;

impl Expiry<String, OtpEntry> for OtpExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &OtpEntry,
        _now: Instant,
    ) -> Option<Duration> {
        Some(value.expires_in)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &OtpEntry,
        _now: Instant,
        _duration: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_in)
    }
}

#[derive(Debug, PartialEq)]
pub enum IssueOutcome {
    Issued { request_count: u32 },
    /// Attempts were exhausted recently; retry after the given seconds.
    CoolingDown { retry_after_secs: u64 },
}

#[derive(Debug, PartialEq)]
pub enum VerifyOutcome {
    /// The code matched; carries the payload stored at issue time.
    Success(Value),
    Mismatch { remaining: u32 },
    Exhausted,
    /// No live code under this key (never issued, expired, or consumed).
    Expired,
}

pub struct OtpStore {
    cache: Cache<String, OtpEntry>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
    cooldown: Duration,
}

impl OtpStore {
    pub fn new(capacity: u64, ttl: Duration, cooldown: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .expire_after(OtpExpiry)
            .build();
        Self {
            cache,
            locks: DashMap::new(),
            ttl,
            cooldown,
        }
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Stores a fresh code under `key`, replacing any live one.
    ///
    /// Refused while an exhausted entry's cooldown is still running.
    pub fn issue(&self, key: &str, code: &str, payload: Value) -> IssueOutcome {
        let key = key.to_ascii_lowercase();
        let lock = self.lock_for(&key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut request_count = 1;
        if let Some(existing) = self.cache.get(&key) {
            if existing.code.is_none() {
                let elapsed = existing.last_request.elapsed();
                if elapsed < self.cooldown {
                    return IssueOutcome::CoolingDown {
                        retry_after_secs: (self.cooldown - elapsed).as_secs().max(1),
                    };
                }
            }
            request_count = existing.request_count + 1;
        }

        self.cache.insert(
            key,
            OtpEntry {
                code: Some(code.to_string()),
                payload,
                attempts: 0,
                request_count,
                last_request: Instant::now(),
                history: Vec::new(),
                expires_in: self.ttl,
            },
        );

        IssueOutcome::Issued { request_count }
    }

    /// Checks `candidate` against the stored code.
    ///
    /// The attempt counter and history advance before the comparison, and
    /// exhaustion is checked before the code: the attempt that reaches the
    /// limit fails closed even when the submitted code is correct. A match
    /// consumes the entry; exhaustion leaves a cooldown tombstone.
    pub fn verify(&self, key: &str, candidate: &str) -> VerifyOutcome {
        let key = key.to_ascii_lowercase();
        let lock = self.lock_for(&key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let Some(mut entry) = self.cache.get(&key) else {
            return VerifyOutcome::Expired;
        };

        let Some(code) = entry.code.clone() else {
            return VerifyOutcome::Exhausted;
        };

        entry.attempts += 1;
        entry.history.push(candidate.to_string());
        if entry.history.len() > HISTORY_LIMIT {
            entry.history.remove(0);
        }

        if entry.attempts >= MAX_ATTEMPTS {
            entry.code = None;
            entry.last_request = Instant::now();
            entry.expires_in = self.cooldown;
            self.cache.insert(key, entry);
            return VerifyOutcome::Exhausted;
        }

        if code == candidate {
            self.cache.invalidate(&key);
            return VerifyOutcome::Success(entry.payload);
        }

        let remaining = MAX_ATTEMPTS - entry.attempts;
        self.cache.insert(key, entry);
        VerifyOutcome::Mismatch { remaining }
    }

    /// Drops any entry (live or tombstone) under `key`.
    pub fn remove(&self, key: &str) {
        self.cache.invalidate(&key.to_ascii_lowercase());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> OtpStore {
        OtpStore::new(1000, Duration::from_secs(600), Duration::from_secs(900))
    }

    #[test]
    fn test_single_use_success() {
        let s = store();
        s.issue("User@Example.com", "123456", json!({ "name": "Ada" }));

        // Keys are case-insensitive.
        assert_eq!(
            s.verify("user@example.COM", "123456"),
            VerifyOutcome::Success(json!({ "name": "Ada" }))
        );

        // Consumed: a second verify finds nothing.
        assert_eq!(s.verify("user@example.com", "123456"), VerifyOutcome::Expired);
    }

    #[test]
    fn test_mismatch_counts_down() {
        let s = store();
        s.issue("a@b.c", "123456", json!({}));

        assert_eq!(
            s.verify("a@b.c", "000000"),
            VerifyOutcome::Mismatch { remaining: 2 }
        );
        assert_eq!(
            s.verify("a@b.c", "000001"),
            VerifyOutcome::Mismatch { remaining: 1 }
        );
        assert_eq!(s.verify("a@b.c", "000002"), VerifyOutcome::Exhausted);

        // Correct code after exhaustion stays exhausted.
        assert_eq!(s.verify("a@b.c", "123456"), VerifyOutcome::Exhausted);
    }

    #[test]
    fn test_correct_code_on_limit_attempt_is_exhausted() {
        let s = store();
        s.issue("a@b.c", "123456", json!({}));
        s.verify("a@b.c", "000000");
        s.verify("a@b.c", "000001");

        // The limit attempt fails closed even with the right code, and the
        // tombstone blocks an immediate reissue.
        assert_eq!(s.verify("a@b.c", "123456"), VerifyOutcome::Exhausted);
        assert!(matches!(
            s.issue("a@b.c", "654321", json!({})),
            IssueOutcome::CoolingDown { .. }
        ));
    }

    #[test]
    fn test_correct_code_below_limit_succeeds() {
        let s = store();
        s.issue("a@b.c", "123456", json!({}));
        s.verify("a@b.c", "000000");

        assert!(matches!(
            s.verify("a@b.c", "123456"),
            VerifyOutcome::Success(_)
        ));
    }

    #[test]
    fn test_exhaustion_triggers_issue_cooldown() {
        let s = store();
        s.issue("a@b.c", "123456", json!({}));
        for _ in 0..3 {
            s.verify("a@b.c", "wrong0");
        }

        match s.issue("a@b.c", "654321", json!({})) {
            IssueOutcome::CoolingDown { retry_after_secs } => {
                assert!(retry_after_secs > 0 && retry_after_secs <= 900);
            }
            other => panic!("expected cooldown, got {other:?}"),
        }
    }

    #[test]
    fn test_reissue_replaces_code_and_counts_requests() {
        let s = store();
        assert_eq!(
            s.issue("a@b.c", "111111", json!({})),
            IssueOutcome::Issued { request_count: 1 }
        );
        assert_eq!(
            s.issue("a@b.c", "222222", json!({})),
            IssueOutcome::Issued { request_count: 2 }
        );

        // Old code is dead after reissue.
        assert_eq!(
            s.verify("a@b.c", "111111"),
            VerifyOutcome::Mismatch { remaining: 2 }
        );
        assert!(matches!(
            s.verify("a@b.c", "222222"),
            VerifyOutcome::Success(_)
        ));
    }

    #[test]
    fn test_ttl_expiry() {
        let s = OtpStore::new(
            1000,
            Duration::from_millis(40),
            Duration::from_secs(900),
        );
        s.issue("a@b.c", "123456", json!({}));

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(s.verify("a@b.c", "123456"), VerifyOutcome::Expired);
    }

    #[test]
    fn test_remove_clears_tombstone() {
        let s = store();
        s.issue("a@b.c", "123456", json!({}));
        for _ in 0..3 {
            s.verify("a@b.c", "wrong0");
        }

        s.remove("a@b.c");
        assert!(matches!(
            s.issue("a@b.c", "654321", json!({})),
            IssueOutcome::Issued { .. }
        ));
    }
}
