// Fixed-window admission control. Intentionally coarse: a burst straddling a
// window boundary can admit up to 2x the limit, which is acceptable for the
// abuse-deterrence this guards (checkout session creation, report export).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};

const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(300);

/// Result of one admission check.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitOutcome {
    pub success: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Bucket {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Shared fixed-window counter map. Constructed once at startup and passed by
/// handle to every call site; the only cross-request mutable state in the
/// service.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject one request for `key`. Atomic per call: the lock is
    /// held across the read-modify-write, so concurrent checks never lose an
    /// increment.
    pub fn check(&self, key: &str, limit: u32, window_secs: u64) -> RateLimitOutcome {
        self.check_at(key, limit, window_secs, Utc::now())
    }

    fn check_at(
        &self,
        key: &str,
        limit: u32,
        window_secs: u64,
        now: DateTime<Utc>,
    ) -> RateLimitOutcome {
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");

        let window = Duration::seconds(window_secs as i64);
        match buckets.get_mut(key) {
            Some(bucket) if bucket.reset_at > now => {
                if bucket.count >= limit {
                    RateLimitOutcome {
                        success: false,
                        remaining: 0,
                        reset_at: bucket.reset_at,
                    }
                } else {
                    bucket.count += 1;
                    RateLimitOutcome {
                        success: true,
                        remaining: limit - bucket.count,
                        reset_at: bucket.reset_at,
                    }
                }
            }
            _ => {
                // Fresh key, or the previous window has expired
                let reset_at = now + window;
                buckets.insert(key.to_string(), Bucket { count: 1, reset_at });
                RateLimitOutcome {
                    success: true,
                    remaining: limit.saturating_sub(1),
                    reset_at,
                }
            }
        }
    }

    /// Drop expired buckets. Returns how many were purged.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.reset_at > now);
        before - buckets.len()
    }

    /// Spawn the periodic sweep task. The returned handle aborts the task
    /// when dropped, tying the sweeper's lifetime to service shutdown.
    pub fn start_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let limiter = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let purged = limiter.sweep();
                if purged > 0 {
                    tracing::debug!("rate limiter swept {} expired buckets", purged);
                }
            }
        });
        SweeperHandle { task }
    }
}

pub struct SweeperHandle {
    task: tokio::task::JoinHandle<()>,
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Client key for per-caller buckets, derived from proxy headers. Requests
/// with neither header share the "unknown" bucket; that coarseness is
/// accepted rather than trusting unauthenticated connection metadata.
pub fn client_key(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn window_admits_exactly_limit() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        for i in 1..=10u32 {
            let outcome = limiter.check_at("k", 10, 60, now);
            assert!(outcome.success, "call {} should be admitted", i);
            assert_eq!(outcome.remaining, 10 - i);
        }

        let denied = limiter.check_at("k", 10, 60, now);
        assert!(!denied.success);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_at, now + Duration::seconds(60));
    }

    #[test]
    fn expired_window_starts_fresh() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        for _ in 0..10 {
            limiter.check_at("k", 10, 60, now);
        }
        assert!(!limiter.check_at("k", 10, 60, now).success);

        let later = now + Duration::seconds(61);
        let outcome = limiter.check_at("k", 10, 60, later);
        assert!(outcome.success);
        assert_eq!(outcome.remaining, 9);
        assert_eq!(outcome.reset_at, later + Duration::seconds(60));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        for _ in 0..5 {
            limiter.check_at("a", 5, 60, now);
        }
        assert!(!limiter.check_at("a", 5, 60, now).success);
        assert!(limiter.check_at("b", 5, 60, now).success);
    }

    #[test]
    fn sweep_purges_only_expired_buckets() {
        let limiter = RateLimiter::new();
        let past = Utc::now() - Duration::seconds(120);

        limiter.check_at("stale", 10, 60, past);
        limiter.check("live", 10, 60);

        assert_eq!(limiter.sweep(), 1);
        // Live bucket kept its count
        assert_eq!(limiter.check("live", 10, 60).remaining, 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_admit_exactly_limit() {
        let limiter = Arc::new(RateLimiter::new());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.check("burst", 10, 60).success
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.expect("task") {
                successes += 1;
            }
        }
        assert_eq!(successes, 10);
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        assert_eq!(client_key(&headers), "10.0.0.1");

        let mut real_only = HeaderMap::new();
        real_only.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        assert_eq!(client_key(&real_only), "10.9.9.9");

        assert_eq!(client_key(&HeaderMap::new()), "unknown");
    }
}
