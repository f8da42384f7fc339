//! Password reset tokens.
//!
//! Tokens are not stored. A token is `"{ts_base36}-{hmac_hex}"` where the
//! HMAC-SHA256 covers the user's id, password hash, last login, the
//! timestamp and the email. Changing the password or logging in therefore
//! invalidates every outstanding token for that user.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::db::User;

type HmacSha256 = Hmac<Sha256>;

const KEY_SALT: &str = "boards.auth.token.PasswordResetTokenGenerator";

/// Creates and checks password reset tokens.
#[derive(Clone)]
pub struct PasswordResetTokenGenerator {
    secret: String,
    timeout_secs: i64,
}

impl PasswordResetTokenGenerator {
    /// Create a generator keyed by `secret` whose tokens live `timeout_secs`.
    pub fn new(secret: impl Into<String>, timeout_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            timeout_secs,
        }
    }

    /// Token lifetime in seconds.
    pub fn timeout_secs(&self) -> i64 {
        self.timeout_secs
    }

    /// Make a token for `user` stamped with `now` (seconds since the epoch).
    pub fn make_token(&self, user: &User, now: i64) -> String {
        let ts = now.max(0) as u64;
        format!("{}-{}", to_base36(ts), self.signature(user, ts))
    }

    /// Make a token stamped with the current time.
    pub fn make_token_now(&self, user: &User) -> String {
        self.make_token(user, chrono::Utc::now().timestamp())
    }

    /// Check that `token` was made for `user` in its current state and has
    /// not expired at `now`.
    pub fn check_token(&self, user: &User, token: &str, now: i64) -> bool {
        let Some((ts_b36, signature)) = token.split_once('-') else {
            return false;
        };
        let Some(ts) = from_base36(ts_b36) else {
            return false;
        };

        if !constant_time_eq(self.signature(user, ts).as_bytes(), signature.as_bytes()) {
            return false;
        }

        let age = now - ts as i64;
        (0..=self.timeout_secs).contains(&age)
    }

    /// Check a token against the current time.
    pub fn check_token_now(&self, user: &User, token: &str) -> bool {
        self.check_token(user, token, chrono::Utc::now().timestamp())
    }

    fn signature(&self, user: &User, ts: u64) -> String {
        let mut key = Vec::with_capacity(KEY_SALT.len() + self.secret.len());
        key.extend_from_slice(KEY_SALT.as_bytes());
        key.extend_from_slice(self.secret.as_bytes());

        // HMAC accepts keys of any length.
        let mut mac = match HmacSha256::new_from_slice(&key) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(user.id.to_string().as_bytes());
        mac.update(user.password.as_bytes());
        mac.update(user.last_login.as_deref().unwrap_or("").as_bytes());
        mac.update(ts.to_string().as_bytes());
        mac.update(user.email.as_bytes());

        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for PasswordResetTokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordResetTokenGenerator")
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Encode a user id for a reset URL.
///
/// ```
/// use boards::auth::token::{decode_uid, encode_uid};
///
/// assert_eq!(encode_uid(1), "MQ");
/// assert_eq!(decode_uid("MQ"), Some(1));
/// ```
pub fn encode_uid(user_id: i64) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string())
}

/// Decode a user id from a reset URL. Returns `None` for anything that is
/// not base64 of a decimal integer.
pub fn decode_uid(uidb64: &str) -> Option<i64> {
    let bytes = URL_SAFE_NO_PAD.decode(uidb64).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    text.parse().ok()
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > 13 {
        return None;
    }
    u64::from_str_radix(s, 36).ok()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
