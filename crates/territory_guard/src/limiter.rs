//! Rate limiting implementation using token bucket algorithm.
//!
//! Used to throttle denial messages so that a player holding down a build key
//! against a protected block sees one line, not one per tick.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Token bucket rate limiter keyed by an arbitrary value.
///
/// The caller supplies the current instant, which keeps the limiter
/// deterministic and usable from a synchronous tick loop.
#[derive(Debug)]
pub struct RateLimiter<K> {
    buckets: HashMap<K, TokenBucket>,
    max_tokens: u32,
    refill_interval: Duration,
    blocked_count: u64,
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
}

impl<K: Hash + Eq> RateLimiter<K> {
    /// Creates a new rate limiter with the specified parameters
    pub fn new(max_tokens: u32, refill_interval: Duration) -> Self {
        Self {
            buckets: HashMap::new(),
            max_tokens: max_tokens.max(1),
            refill_interval,
            blocked_count: 0,
        }
    }

    /// A limiter that lets one event through per `cooldown`.
    pub fn cooldown(cooldown: Duration) -> Self {
        Self::new(1, cooldown)
    }

    /// Checks if an event for `key` should be let through at `now`
    pub fn check(&mut self, key: K, now: Instant) -> bool {
        let max_tokens = self.max_tokens;
        let bucket = self.buckets.entry(key).or_insert(TokenBucket {
            tokens: max_tokens,
            last_refill: now,
        });

        // Refill tokens based on elapsed time
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        if elapsed >= self.refill_interval {
            let intervals_passed = match self.refill_interval.as_millis() {
                0 => u128::from(max_tokens),
                interval => elapsed.as_millis() / interval,
            };
            let tokens_to_add = intervals_passed.min(u128::from(max_tokens - bucket.tokens)) as u32;
            bucket.tokens = (bucket.tokens + tokens_to_add).min(max_tokens);
            bucket.last_refill = now;
        }

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            self.blocked_count += 1;
            false
        }
    }

    /// Total number of events held back
    pub fn blocked_count(&self) -> u64 {
        self.blocked_count
    }

    /// Drops buckets untouched for longer than `max_age`
    pub fn cleanup_old_entries(&mut self, now: Instant, max_age: Duration) {
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < max_age);
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_allows_within_limit() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check("alice", now));
        }

        assert!(!limiter.check("alice", now));
        assert!(limiter.check("bob", now));
        assert_eq!(limiter.blocked_count(), 1);
    }

    #[test]
    fn test_rate_limiter_refill() {
        let mut limiter = RateLimiter::cooldown(Duration::from_millis(1500));
        let start = Instant::now();

        assert!(limiter.check(1u8, start));
        assert!(!limiter.check(1u8, start + Duration::from_millis(500)));
        assert!(!limiter.check(1u8, start + Duration::from_millis(1499)));
        assert!(limiter.check(1u8, start + Duration::from_millis(1500)));
    }

    #[test]
    fn test_cleanup_drops_idle_keys() {
        let mut limiter = RateLimiter::cooldown(Duration::from_millis(100));
        let start = Instant::now();
        limiter.check("idle", start);
        limiter.check("busy", start + Duration::from_secs(50));

        limiter.cleanup_old_entries(start + Duration::from_secs(60), Duration::from_secs(30));

        assert_eq!(limiter.tracked_keys(), 1);
    }
}
