//! CSRF protection.
//!
//! Double-submit scheme: the `csrftoken` cookie and the hidden
//! `csrfmiddlewaretoken` form field must carry the same value on every
//! POST. The middleware issues the cookie on first contact and exposes the
//! token to handlers through the [`CsrfToken`] extractor.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    body::{to_bytes, Body},
    extract::{FromRequestParts, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use url::form_urlencoded;

use crate::web::error::WebError;
use crate::web::forms::CSRF_FIELD;
use crate::web::handlers::AppState;

/// Name of the CSRF cookie.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Largest form body accepted.
const MAX_FORM_BYTES: usize = 1024 * 1024;

const CSRF_FAILURE: &str = "CSRF verification failed. Request aborted.";

/// The CSRF token of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

impl CsrfToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        CsrfToken(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CsrfToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .unwrap_or_else(CsrfToken::generate))
    }
}

/// Issue the CSRF cookie and, when enforcement is on, check POST bodies.
pub async fn csrf_protect(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let existing = CookieJar::from_headers(req.headers())
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    let mut req = if req.method() == Method::POST && state.config.web.csrf_enforce {
        let (parts, body) = req.into_parts();
        let bytes = match to_bytes(body, MAX_FORM_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), error = %e, "Unreadable form body");
                return WebError::Forbidden(CSRF_FAILURE.to_string()).into_response();
            }
        };

        let submitted = form_urlencoded::parse(&bytes)
            .find(|(key, _)| key == CSRF_FIELD)
            .map(|(_, value)| value.into_owned());

        if !tokens_match(existing.as_deref(), submitted.as_deref()) {
            tracing::warn!(path = %parts.uri.path(), "CSRF verification failed");
            return WebError::Forbidden(CSRF_FAILURE.to_string()).into_response();
        }
        Request::from_parts(parts, Body::from(bytes))
    } else {
        req
    };

    let token = existing
        .clone()
        .map(CsrfToken)
        .unwrap_or_else(CsrfToken::generate);
    req.extensions_mut().insert(token.clone());

    let mut response = next.run(req).await;

    if existing.is_none() {
        let cookie = Cookie::build((CSRF_COOKIE, token.0))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(state.config.web.secure_cookies)
            .build();
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

/// Compare the cookie and submitted tokens without short-circuiting.
fn tokens_match(cookie: Option<&str>, submitted: Option<&str>) -> bool {
    let (Some(cookie), Some(submitted)) = (cookie, submitted) else {
        return false;
    };
    if cookie.len() != submitted.len() {
        return false;
    }
    cookie
        .bytes()
        .zip(submitted.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_differ() {
        let a = CsrfToken::generate();
        let b = CsrfToken::generate();
        assert_eq!(a.as_str().len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(Some("abc"), Some("abc")));
        assert!(!tokens_match(Some("abc"), Some("abd")));
        assert!(!tokens_match(Some("abc"), Some("abcd")));
        assert!(!tokens_match(None, Some("abc")));
        assert!(!tokens_match(Some("abc"), None));
        assert!(!tokens_match(None, None));
    }
}
