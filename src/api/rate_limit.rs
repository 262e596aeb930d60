//! Fixed-window request quota per caller

use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// Count one request for `key`; on rejection returns how long until the window resets.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.limit {
            let elapsed = now.saturating_duration_since(entry.started);
            return Err(self.window.saturating_sub(elapsed));
        }

        entry.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_past_limit_until_window_resets() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("alice", start).is_ok());
        assert!(limiter.check_at("alice", start).is_ok());

        let retry = limiter
            .check_at("alice", start + Duration::from_secs(4))
            .unwrap_err();
        assert_eq!(retry, Duration::from_secs(6));

        assert!(limiter
            .check_at("alice", start + Duration::from_secs(10))
            .is_ok());
    }

    #[test]
    fn callers_have_separate_windows() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_at("alice", now).is_ok());
        assert!(limiter.check_at("alice", now).is_err());
        assert!(limiter.check_at("bob", now).is_ok());
    }
}
