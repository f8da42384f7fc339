//! Middleware and request extractors for the web UI.

pub mod csrf;
pub mod error_pages;
pub mod rate_limit;
pub mod security;
pub mod session;

pub use csrf::{csrf_protect, CsrfToken, CSRF_COOKIE};
pub use error_pages::error_pages;
pub use rate_limit::{login_rate_limit, reset_rate_limit, RateLimitState};
pub use security::security_headers;
pub use session::{removal_cookie, session_cookie, CurrentUser, RequireLogin, SESSION_COOKIE};
