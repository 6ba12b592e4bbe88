//! Fixed-window request rate limiting.
//!
//! Bounds the call rate of a logical action identified by an
//! arbitrary string key (e.g., `whatsapp:<contact-id>`, `ai-search`),
//! protecting provider-backed endpoints from abuse and accidental
//! retry storms. This is a fixed-window counter, not a sliding window
//! or a refilling token bucket: callers get a hard ceiling per
//! discrete window per key, not smooth rate shaping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use aurora_core::error::{AuroraError, AuroraResult};

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    /// Unix milliseconds at which the current window expires.
    expires_at_ms: i64,
}

/// Shared keyed counter service with process-wide lifetime.
///
/// Cheap to clone (all clones share the same buckets); intended to be
/// constructed once and injected into every handler that needs it
/// rather than hidden behind a global. The check-then-increment is a
/// single indivisible step under the lock, so two concurrent requests
/// can never both pass a window with one slot left.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one call against `key`, failing with `RateLimited` once
    /// `limit` calls have been counted inside the current window.
    /// An elapsed window resets the count; a rejected call does not
    /// consume the window further.
    pub fn enforce(&self, key: &str, limit: u32, window_ms: u64) -> AuroraResult<()> {
        self.enforce_at(key, limit, window_ms, Utc::now().timestamp_millis())
    }

    /// Deterministic variant taking the current time explicitly.
    pub fn enforce_at(
        &self,
        key: &str,
        limit: u32,
        window_ms: u64,
        now_ms: i64,
    ) -> AuroraResult<()> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| AuroraError::Database("rate limiter lock poisoned".into()))?;

        match buckets.get_mut(key) {
            Some(bucket) if bucket.expires_at_ms >= now_ms => {
                if bucket.count >= limit {
                    return Err(AuroraError::RateLimited);
                }
                bucket.count += 1;
                Ok(())
            }
            _ => {
                buckets.insert(
                    key.to_string(),
                    Bucket {
                        count: 1,
                        expires_at_ms: now_ms + window_ms as i64,
                    },
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new();
        let now = 1_000;

        for _ in 0..3 {
            limiter.enforce_at("k", 3, 60_000, now).unwrap();
        }
        let err = limiter.enforce_at("k", 3, 60_000, now).unwrap_err();
        assert!(matches!(err, AuroraError::RateLimited));
    }

    #[test]
    fn rejection_does_not_consume_the_window() {
        let limiter = RateLimiter::new();
        let now = 1_000;

        limiter.enforce_at("k", 1, 60_000, now).unwrap();
        for _ in 0..5 {
            assert!(limiter.enforce_at("k", 1, 60_000, now).is_err());
        }
        // Still exactly one slot after the window elapses.
        limiter.enforce_at("k", 1, 60_000, now + 60_001).unwrap();
        assert!(limiter.enforce_at("k", 1, 60_000, now + 60_002).is_err());
    }

    #[test]
    fn window_elapse_resets_the_count() {
        let limiter = RateLimiter::new();
        let now = 1_000;

        for _ in 0..3 {
            limiter.enforce_at("k", 3, 60_000, now).unwrap();
        }
        assert!(limiter.enforce_at("k", 3, 60_000, now).is_err());

        let later = now + 60_001;
        for _ in 0..3 {
            limiter.enforce_at("k", 3, 60_000, later).unwrap();
        }
        assert!(limiter.enforce_at("k", 3, 60_000, later).is_err());
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        let now = 1_000;

        limiter.enforce_at("whatsapp:42", 1, 60_000, now).unwrap();
        assert!(limiter.enforce_at("whatsapp:42", 1, 60_000, now).is_err());
        limiter.enforce_at("whatsapp:43", 1, 60_000, now).unwrap();
        limiter.enforce_at("ai-search", 1, 60_000, now).unwrap();
    }

    #[test]
    fn clones_share_buckets() {
        let limiter = RateLimiter::new();
        let clone = limiter.clone();
        let now = 1_000;

        limiter.enforce_at("k", 1, 60_000, now).unwrap();
        assert!(clone.enforce_at("k", 1, 60_000, now).is_err());
    }

    #[test]
    fn wall_clock_entry_point_works() {
        let limiter = RateLimiter::new();
        limiter.enforce("k", 2, 60_000).unwrap();
        limiter.enforce("k", 2, 60_000).unwrap();
        assert!(limiter.enforce("k", 2, 60_000).is_err());
    }
}
