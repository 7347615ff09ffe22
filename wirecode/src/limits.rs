//! Rate limiting policy points for mutating actions.
//!
//! Each logical action key (e.g. "wireframe-creation") gets a named limiter
//! that is consulted before the mutation runs. The default configuration
//! admits everything (`max_requests = 0`), but the interface - action key,
//! requester identity, time window - is fixed so a real policy can be
//! substituted without touching callers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::{LimitsConfig, RateLimitConfig};
use crate::errors::{Error, Result};

/// Container for all action limiters.
#[derive(Debug, Default, Clone)]
pub struct Limiters {
    /// Limiter for the "wireframe-creation" action. None means unlimited.
    wireframe_creation: Option<Arc<RateLimiter>>,
}

impl Limiters {
    /// Creates all limiters from configuration.
    pub fn new(config: &LimitsConfig) -> Self {
        Self {
            wireframe_creation: RateLimiter::new("wireframe-creation", &config.wireframe_creation).map(Arc::new),
        }
    }

    /// Check the "wireframe-creation" action for the given caller identity.
    pub fn check_wireframe_creation(&self, identity: &str) -> Result<()> {
        match &self.wireframe_creation {
            Some(limiter) => limiter.check(identity),
            None => Ok(()),
        }
    }
}

/// Fixed-window request counter keyed by caller identity.
#[derive(Debug)]
pub struct RateLimiter {
    action: &'static str,
    max_requests: u32,
    window: Duration,
    windows: DashMap<String, WindowState>,
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    /// Creates a limiter from configuration.
    ///
    /// If `max_requests` is 0, returns `None` (unlimited).
    pub fn new(action: &'static str, config: &RateLimitConfig) -> Option<Self> {
        if config.max_requests == 0 {
            return None;
        }

        Some(Self {
            action,
            max_requests: config.max_requests,
            window: config.window,
            windows: DashMap::new(),
        })
    }

    /// Record one request for `identity` and reject with 429 once the window
    /// budget is spent. The window restarts after it elapses.
    pub fn check(&self, identity: &str) -> Result<()> {
        let now = Instant::now();
        let mut entry = self.windows.entry(identity.to_string()).or_insert(WindowState {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            return Err(Error::TooManyRequests {
                message: format!("Rate limit exceeded for {}. Please retry later.", self.action),
            });
        }

        entry.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(max_requests: u32, window_secs: u64) -> RateLimitConfig {
        RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    #[test]
    fn zero_max_requests_is_unlimited() {
        assert!(RateLimiter::new("test", &test_config(0, 60)).is_none());

        let limiters = Limiters::new(&LimitsConfig::default());
        for _ in 0..1000 {
            assert!(limiters.check_wireframe_creation("a@example.com").is_ok());
        }
    }

    #[test]
    fn rejects_once_window_budget_is_spent() {
        let limiter = RateLimiter::new("wireframe-creation", &test_config(3, 60)).unwrap();

        for _ in 0..3 {
            assert!(limiter.check("a@example.com").is_ok());
        }

        let result = limiter.check("a@example.com");
        assert!(matches!(result, Err(Error::TooManyRequests { .. })));
    }

    #[test]
    fn identities_are_tracked_independently() {
        let limiter = RateLimiter::new("wireframe-creation", &test_config(1, 60)).unwrap();

        assert!(limiter.check("a@example.com").is_ok());
        assert!(limiter.check("a@example.com").is_err());
        assert!(limiter.check("b@example.com").is_ok());
    }

    #[test]
    fn window_restarts_after_elapsing() {
        let limiter = RateLimiter::new("wireframe-creation", &test_config(1, 0)).unwrap();

        // Zero-length window: every check starts a fresh window
        assert!(limiter.check("a@example.com").is_ok());
        assert!(limiter.check("a@example.com").is_ok());
    }
}
