//! Form and query payloads for the web UI.
//!
//! Every field defaults to empty so a missing field is reported by form
//! validation instead of being rejected by the extractor.

use serde::Deserialize;

/// Name of the hidden CSRF field carried by every form.
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

/// Signup form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Login form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: String,
}

/// Password reset request form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetForm {
    pub email: String,
}

/// New password form used by the reset confirmation page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetPasswordForm {
    pub new_password1: String,
    pub new_password2: String,
}

/// Password change form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordChangeForm {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Account settings form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// New topic form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewTopicForm {
    pub subject: String,
    pub message: String,
}

/// Reply and edit form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub message: String,
}

/// `?page=` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page number; garbage is treated as absent.
    pub fn number(&self) -> Option<i64> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

/// `?next=` query of the login page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths are accepted as redirect targets.
///
/// Whitespace and control characters are refused outright: browsers drop
/// tabs and newlines from URLs, so `/\t/host` would act like `//host`, and
/// control characters are not valid in a `Location` header.
pub fn safe_next(next: &str) -> &str {
    let next = next.trim();
    if next.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return "/";
    }
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        next
    } else {
        "/"
    }
}

/// Login URL that returns to `path` afterwards.
///
/// Slashes are left unescaped.
pub fn login_url(path: &str) -> String {
    format!(
        "/login/?next={}",
        urlencoding::encode(path).replace("%2F", "/")
    )
}
