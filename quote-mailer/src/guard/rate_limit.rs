//! Fixed-window rate limiting per client address.
//!
//! The counter lives behind [`RateLimitStore`] so a shared external store can
//! replace the in-process map. The in-memory store forgets everything on
//! restart, which makes the limit best-effort.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;

/// Counter state for one client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_at: Instant,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

/// Storage for rate-limit records keyed by client.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateLimitRecord>;
    fn set(&self, key: &str, record: RateLimitRecord);
}

/// Process-lifetime store. Entries are never evicted, only reset on the
/// client's next request after expiry.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RateLimitRecord>> {
        // A panic while holding the lock cannot leave a record half-written.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<RateLimitRecord> {
        self.lock().get(key).copied()
    }

    fn set(&self, key: &str, record: RateLimitRecord) {
        self.lock().insert(key.to_string(), record);
    }
}

/// Fixed-window counter: `limit` requests per `window` per key.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, limit: u32, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    /// In-memory limiter, the default for a single instance.
    pub fn in_memory(limit: u32, window: Duration) -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()), limit, window)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        match self.store.get(key) {
            Some(mut record) if record.reset_at > now => {
                if record.count >= self.limit {
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                    };
                }
                record.count += 1;
                self.store.set(key, record);
                RateLimitDecision {
                    allowed: true,
                    remaining: self.limit - record.count,
                }
            }
            _ => {
                self.store.set(
                    key,
                    RateLimitRecord {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                RateLimitDecision {
                    // A zero limit still admits the first request of a window.
                    allowed: true,
                    remaining: self.limit.saturating_sub(1),
                }
            }
        }
    }
}

/// Derive the client key from proxy headers.
///
/// First hop of `X-Forwarded-For`, then `CF-Connecting-IP`, then `unknown`.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let cloudflare = || {
        headers
            .get("cf-connecting-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(cloudflare)
        .unwrap_or("unknown")
        .to_string()
}
