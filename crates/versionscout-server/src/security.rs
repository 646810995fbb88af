//! Request-level protection for the web API
//!
//! - Per-IP rate limiting (token bucket, quotas expressed per minute)
//! - Client address resolution, optionally trusting `X-Forwarded-For`
//! - Security headers stamped on every response

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token-bucket limiter keyed by client IP
pub struct RateLimiter {
    buckets: RwLock<HashMap<String, RateBucket>>,
    /// Bucket size, also the number of requests allowed per minute
    per_minute: u32,
}

struct RateBucket {
    tokens: f64,
    last_update: Instant,
}

impl RateLimiter {
    pub fn per_minute(per_minute: u32) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            per_minute,
        }
    }

    /// Take one token for this IP; `false` means the request must be refused
    pub async fn check(&self, ip: &str) -> bool {
        self.check_at(ip, Instant::now()).await
    }

    async fn check_at(&self, ip: &str, now: Instant) -> bool {
        let capacity = self.per_minute as f64;
        let mut buckets = self.buckets.write().await;

        let bucket = buckets.entry(ip.to_string()).or_insert_with(|| RateBucket {
            tokens: capacity,
            last_update: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_update).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * capacity / 60.0).min(capacity);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets idle for longer than `max_age`
    pub async fn cleanup(&self, max_age: Duration) {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
    }

    pub async fn tracked_clients(&self) -> usize {
        self.buckets.read().await.len()
    }
}

/// Address used for rate limiting
///
/// Behind a reverse proxy the socket address is the proxy's, so the first
/// `X-Forwarded-For` entry is used instead. Only enable that when a proxy
/// really sits in front, otherwise clients can pick their own bucket.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware adding the usual hardening headers
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

/// Origins allowed to call the API from a browser
pub fn is_local_origin(origin: &[u8]) -> bool {
    ["http://localhost", "http://127.0.0.1", "https://localhost"]
        .iter()
        .any(|prefix| {
            origin.starts_with(prefix.as_bytes())
                && matches!(origin.get(prefix.len()), None | Some(b':'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_quota() {
        let limiter = RateLimiter::per_minute(5);

        for _ in 0..5 {
            assert!(limiter.check("1.2.3.4").await);
        }
        assert!(!limiter.check("1.2.3.4").await);

        // Other clients have their own bucket
        assert!(limiter.check("5.6.7.8").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_refills_over_a_minute() {
        let limiter = RateLimiter::per_minute(30);
        let start = Instant::now();

        for _ in 0..30 {
            assert!(limiter.check_at("ip", start).await);
        }
        assert!(!limiter.check_at("ip", start).await);

        // 30/min is one token every two seconds
        assert!(!limiter.check_at("ip", start + Duration::from_secs(1)).await);
        assert!(limiter.check_at("ip", start + Duration::from_secs(3)).await);
    }

    #[tokio::test]
    async fn test_cleanup() {
        let limiter = RateLimiter::per_minute(5);
        limiter.check("a").await;
        limiter.check("b").await;
        assert_eq!(limiter.tracked_clients().await, 2);

        limiter.cleanup(Duration::ZERO).await;
        assert_eq!(limiter.tracked_clients().await, 0);
    }

    #[test]
    fn test_client_ip() {
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));

        assert_eq!(client_ip(&headers, Some(peer), false), "10.0.0.1");
        assert_eq!(client_ip(&headers, Some(peer), true), "203.0.113.9");
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer), true), "10.0.0.1");
        assert_eq!(client_ip(&HeaderMap::new(), None, false), "unknown");
    }

    #[test]
    fn test_local_origins() {
        assert!(is_local_origin(b"http://localhost:3000"));
        assert!(is_local_origin(b"http://localhost"));
        assert!(is_local_origin(b"http://127.0.0.1:8080"));
        assert!(!is_local_origin(b"http://localhost.evil.com"));
        assert!(!is_local_origin(b"https://example.com"));
    }
}
