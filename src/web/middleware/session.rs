//! Session extractors.
//!
//! The session key travels in the `sessionid` cookie. [`CurrentUser`]
//! resolves it to the logged-in account, [`RequireLogin`] additionally
//! sends anonymous visitors to the login page.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::permission::require_login;
use crate::db::User;
use crate::web::error::WebError;
use crate::web::forms::login_url;
use crate::web::handlers::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sessionid";

/// The logged-in user, if any.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Resolved once per request.
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let user = match jar.get(SESSION_COOKIE) {
            Some(cookie) if !cookie.value().is_empty() => state
                .sessions()
                .current_user(cookie.value())
                .await
                .map_err(|e| WebError::internal(e.to_string()))?,
            _ => None,
        };

        let current = CurrentUser(user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// A logged-in user. Anonymous requests are redirected to
/// `/login/?next=<path>`.
#[derive(Debug, Clone)]
pub struct RequireLogin(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireLogin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match require_login(current.user()) {
            Ok(user) => Ok(RequireLogin(user.clone())),
            Err(_) => {
                let path = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(Redirect::to(&login_url(path)).into_response())
            }
        }
    }
}

/// Cookie carrying a freshly created session key.
pub fn session_cookie(session_key: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_key))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie that removes the session cookie from the browser.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));

        assert_eq!(session_cookie("abc".to_string(), true).secure(), Some(true));
    }
}
