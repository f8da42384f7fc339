//! Rate limiting middleware.
//!
//! Per-IP quotas on the form submissions that send mail or check
//! passwords. Only POSTs are counted, so rendering the forms stays free.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::web::error::WebError;

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

type LimiterMap = RwLock<HashMap<String, Arc<IpRateLimiter>>>;

/// How often idle limiters are dropped.
const CLEANUP_INTERVAL_SECS: u64 = 300;

/// State for rate limiting.
#[derive(Default)]
pub struct RateLimitState {
    /// Per-IP limiters for password reset requests.
    reset_limiters: LimiterMap,
    /// Per-IP limiters for login attempts.
    login_limiters: LimiterMap,
    /// Reset requests allowed per minute.
    reset_rate_limit: u32,
    /// Login attempts allowed per minute.
    login_rate_limit: u32,
    /// Key clients by `X-Forwarded-For`/`X-Real-IP` instead of the socket.
    trust_proxy_headers: bool,
}

fn read(map: &LimiterMap) -> RwLockReadGuard<'_, HashMap<String, Arc<IpRateLimiter>>> {
    map.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(map: &LimiterMap) -> RwLockWriteGuard<'_, HashMap<String, Arc<IpRateLimiter>>> {
    map.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RateLimitState {
    /// Create a new rate limit state.
    pub fn new(reset_rate_limit: u32, login_rate_limit: u32) -> Self {
        Self {
            reset_rate_limit,
            login_rate_limit,
            ..Self::default()
        }
    }

    /// Take the client address from proxy headers.
    ///
    /// Only safe behind a reverse proxy that overwrites those headers.
    pub fn with_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Address a request is counted against.
    pub fn client_ip(&self, req: &Request<Body>) -> String {
        if self.trust_proxy_headers {
            if let Some(ip) = forwarded_ip(req) {
                return ip;
            }
        }

        match req.extensions().get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => addr.ip().to_string(),
            None => "unknown".to_string(),
        }
    }

    /// Get or create a rate limiter for the given IP.
    fn get_or_create_limiter(
        limiters: &LimiterMap,
        ip: &str,
        requests_per_minute: u32,
    ) -> Arc<IpRateLimiter> {
        if let Some(limiter) = read(limiters).get(ip) {
            return limiter.clone();
        }

        let mut guard = write(limiters);
        guard
            .entry(ip.to_string())
            .or_insert_with(|| {
                let quota = Quota::per_minute(
                    NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN),
                );
                Arc::new(RateLimiter::direct(quota))
            })
            .clone()
    }

    /// Check if a password reset request is allowed for `ip`.
    pub fn check_reset(&self, ip: &str) -> bool {
        Self::get_or_create_limiter(&self.reset_limiters, ip, self.reset_rate_limit)
            .check()
            .is_ok()
    }

    /// Check if a login attempt is allowed for `ip`.
    pub fn check_login(&self, ip: &str) -> bool {
        Self::get_or_create_limiter(&self.login_limiters, ip, self.login_rate_limit)
            .check()
            .is_ok()
    }

    /// Number of tracked client addresses.
    pub fn tracked(&self) -> usize {
        read(&self.reset_limiters).len() + read(&self.login_limiters).len()
    }

    /// Drop limiters no request is currently using.
    pub fn cleanup(&self) {
        write(&self.reset_limiters).retain(|_, v| Arc::strong_count(v) > 1);
        write(&self.login_limiters).retain(|_, v| Arc::strong_count(v) > 1);
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Client address reported by a reverse proxy.
fn forwarded_ip(req: &Request<Body>) -> Option<String> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    // First hop of the chain.
    header("X-Forwarded-For")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .or_else(|| header("X-Real-IP").map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
}

/// Rate limit password reset submissions.
pub async fn reset_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::POST {
        let ip = state.client_ip(&req);
        if !state.check_reset(&ip) {
            tracing::warn!(ip = %ip, "Password reset rate limit exceeded");
            return WebError::TooManyRequests(
                "Too many password reset requests. Please try again later.".to_string(),
            )
            .into_response();
        }
    }

    next.run(req).await
}

/// Rate limit login submissions.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::POST {
        let ip = state.client_ip(&req);
        if !state.check_login(&ip) {
            tracing::warn!(ip = %ip, "Login rate limit exceeded");
            return WebError::TooManyRequests(
                "Too many login attempts. Please try again later.".to_string(),
            )
            .into_response();
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::util::ServiceExt;

    #[test]
    fn test_reset_rate_limit() {
        let state = RateLimitState::new(3, 100);

        assert!(state.check_reset("127.0.0.1"));
        assert!(state.check_reset("127.0.0.1"));
        assert!(state.check_reset("127.0.0.1"));
        assert!(!state.check_reset("127.0.0.1"));

        // Other clients have their own quota.
        assert!(state.check_reset("192.168.1.1"));
    }

    #[test]
    fn test_login_rate_limit_is_separate() {
        let state = RateLimitState::new(1, 2);

        assert!(state.check_reset("10.0.0.1"));
        assert!(state.check_login("10.0.0.1"));
        assert!(state.check_login("10.0.0.1"));
        assert!(!state.check_login("10.0.0.1"));
    }

    #[test]
    fn test_cleanup_drops_idle_limiters() {
        let state = RateLimitState::new(5, 5);
        state.check_reset("10.0.0.1");
        state.check_login("10.0.0.2");
        assert_eq!(state.tracked(), 2);

        state.cleanup();
        assert_eq!(state.tracked(), 0);
    }

    fn forwarded_request() -> Request<Body> {
        let mut req = Request::builder()
            .uri("/")
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "198.51.100.9")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        req
    }

    #[test]
    fn test_client_ip_ignores_proxy_headers_by_default() {
        let state = RateLimitState::new(5, 5);
        assert_eq!(state.client_ip(&forwarded_request()), "192.0.2.1");

        let req = Request::builder()
            .uri("/")
            .header("X-Forwarded-For", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(state.client_ip(&req), "unknown");
    }

    #[test]
    fn test_client_ip_trusts_proxy_headers_when_enabled() {
        let state = RateLimitState::new(5, 5).with_proxy_headers(true);
        assert_eq!(state.client_ip(&forwarded_request()), "203.0.113.7");

        let mut req = forwarded_request();
        req.headers_mut().remove("X-Forwarded-For");
        assert_eq!(state.client_ip(&req), "198.51.100.9");

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(state.client_ip(&req), "unknown");
    }

    #[tokio::test]
    async fn test_rotating_forwarded_header_does_not_reset_quota() {
        let state = Arc::new(RateLimitState::new(1, 1));
        let app = Router::new()
            .route("/reset/", get(|| async { "form" }).post(|| async { "sent" }))
            .layer(middleware::from_fn(move |req, next| {
                reset_rate_limit(state.clone(), req, next)
            }));

        let post = |ip: &str| {
            Request::post("/reset/")
                .header("X-Forwarded-For", ip)
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(post("203.0.113.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let second = app.oneshot(post("203.0.113.2")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_only_posts_are_counted() {
        let state = Arc::new(RateLimitState::new(1, 1));
        let app = Router::new()
            .route("/reset/", get(|| async { "form" }).post(|| async { "sent" }))
            .layer(middleware::from_fn(move |req, next| {
                reset_rate_limit(state.clone(), req, next)
            }));

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(Request::get("/reset/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let first = app
            .clone()
            .oneshot(Request::post("/reset/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(Request::post("/reset/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
