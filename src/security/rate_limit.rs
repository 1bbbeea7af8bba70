//! Fixed-window rate limiting per client address.
//!
//! Each client gets a window that opens on its first request and lasts
//! `window_secs`. Requests beyond `max_requests` inside the window are
//! rejected with `429` until the window resets.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::http::request::{client_ip, path_has_prefix};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    reset_at: u64,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Unix time (seconds) at which the window resets.
    pub reset_at: u64,
    /// Seconds until the window resets.
    pub retry_after: u64,
}

impl RateLimitDecision {
    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert("x-ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(self.remaining));
        headers.insert("x-ratelimit-reset", HeaderValue::from(self.reset_at));
        if !self.allowed {
            headers.insert(header::RETRY_AFTER, HeaderValue::from(self.retry_after));
        }
    }
}

/// Shared rate limiter state.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    config: RateLimitConfig,
    trust_proxy: bool,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, trust_proxy: bool) -> Self {
        Self {
            windows: DashMap::new(),
            config,
            trust_proxy,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Whether `path` falls under the limited prefix.
    pub fn applies_to(&self, path: &str) -> bool {
        path_has_prefix(path, &self.config.path_prefix)
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, unix_now())
    }

    /// Count one request for `key` at time `now` (Unix seconds).
    pub fn check_at(&self, key: &str, now: u64) -> RateLimitDecision {
        let limit = self.config.max_requests;
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + self.config.window_secs,
        });
        let window = entry.value_mut();
        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now + self.config.window_secs;
        }
        window.count += 1;

        RateLimitDecision {
            allowed: window.count <= limit,
            limit,
            remaining: limit.saturating_sub(window.count),
            reset_at: window.reset_at,
            retry_after: window.reset_at.saturating_sub(now),
        }
    }

    /// Drop windows that have expired by `now`. Returns how many were removed.
    pub fn prune_at(&self, now: u64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| window.reset_at > now);
        before - self.windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Periodically prune expired windows until shutdown.
pub fn start_cleanup_task(
    limiter: Arc<RateLimiter>,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let period = Duration::from_secs(limiter.config.cleanup_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.prune_at(unix_now());
                    if removed > 0 {
                        tracing::debug!(removed, remaining = limiter.tracked_clients(), "Pruned rate limit windows");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.config.enabled || !limiter.applies_to(request.uri().path()) {
        return next.run(request).await;
    }

    let client = client_ip(&request, limiter.trust_proxy);
    let decision = limiter.check(&client);

    if decision.allowed {
        let mut response = next.run(request).await;
        decision.write_headers(response.headers_mut());
        return response;
    }

    tracing::warn!(
        client = %client,
        path = %request.uri().path(),
        retry_after = decision.retry_after,
        "Rate limit exceeded"
    );
    metrics::record_rate_limited(&limiter.config.path_prefix);

    let mut response = Response::new(Body::from(limiter.config.message.clone()));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    decision.write_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u64, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            RateLimitConfig {
                max_requests,
                window_secs,
                ..Default::default()
            },
            true,
        )
    }

    #[test]
    fn test_limit_within_window() {
        let limiter = limiter(3, 60);
        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check_at("1.2.3.4", 1000);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }
        let decision = limiter.check_at("1.2.3.4", 1010);
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after, 50);
        assert_eq!(decision.reset_at, 1060);

        // Other clients are counted separately.
        assert!(limiter.check_at("5.6.7.8", 1010).allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = limiter(1, 60);
        assert!(limiter.check_at("a", 0).allowed);
        assert!(!limiter.check_at("a", 59).allowed);
        assert!(limiter.check_at("a", 60).allowed);
    }

    #[test]
    fn test_prune_expired() {
        let limiter = limiter(1, 60);
        limiter.check_at("a", 0);
        limiter.check_at("b", 30);
        assert_eq!(limiter.prune_at(60), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_applies_to_prefix() {
        let limiter = limiter(1, 60);
        assert!(limiter.applies_to("/api"));
        assert!(limiter.applies_to("/api/v1/tours"));
        assert!(!limiter.applies_to("/apiary"));
        assert!(!limiter.applies_to("/tour/the-forest-hiker"));
    }
}
