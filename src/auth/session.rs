//! Authentication session management for Boards.
//!
//! This module provides credential checks, login/logout against the
//! server-side session table, and login attempt rate limiting.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{DbPool, NewSession, Session, SessionRepository, User, UserRepository};

/// Session-related errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Invalid credentials (wrong username or password).
    #[error("Please enter a correct username and password. Note that both fields may be case-sensitive.")]
    InvalidCredentials,

    /// Account is locked due to too many failed attempts.
    #[error("Too many failed login attempts. Try again in {0} seconds.")]
    AccountLocked(u64),

    /// Account is inactive.
    #[error("This account is inactive.")]
    AccountInactive,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<crate::BoardsError> for SessionError {
    fn from(e: crate::BoardsError) -> Self {
        SessionError::Database(e.to_string())
    }
}

/// Default session lifetime (two weeks).
pub const DEFAULT_SESSION_DURATION_SECS: i64 = 14 * 24 * 60 * 60;

/// Maximum login attempts before lockout.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Lockout duration (5 minutes).
pub const LOCKOUT_DURATION_SECS: u64 = 5 * 60;

/// Result of a login attempt rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitResult {
    /// Login attempt is allowed.
    Allowed,
    /// Account is locked for the specified duration.
    Locked(Duration),
}

/// Login attempt rate limiter.
///
/// Tracks failed login attempts per username and enforces lockout
/// after too many failures.
#[derive(Debug)]
pub struct LoginLimiter {
    /// Failed attempt times per lowercased username.
    attempts: HashMap<String, Vec<Instant>>,
    max_attempts: u32,
    /// Time window for counting attempts.
    window: Duration,
    lockout: Duration,
}

impl Default for LoginLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginLimiter {
    /// Create a new limiter with default settings.
    pub fn new() -> Self {
        Self::with_config(MAX_LOGIN_ATTEMPTS, LOCKOUT_DURATION_SECS)
    }

    /// Create a limiter with custom settings.
    ///
    /// The counting window equals the lockout duration.
    pub fn with_config(max_attempts: u32, lockout_secs: u64) -> Self {
        Self {
            attempts: HashMap::new(),
            max_attempts,
            window: Duration::from_secs(lockout_secs),
            lockout: Duration::from_secs(lockout_secs),
        }
    }

    /// Check if a login attempt is allowed for the given username.
    ///
    /// Usernames without recorded failures are not stored.
    pub fn check(&mut self, username: &str) -> LimitResult {
        let key = username.to_lowercase();
        let Some(attempts) = self.attempts.get_mut(&key) else {
            return LimitResult::Allowed;
        };

        let now = Instant::now();
        let window = self.window;
        attempts.retain(|t| now.duration_since(*t) < window);

        if attempts.len() >= self.max_attempts as usize {
            if let Some(oldest) = attempts.first() {
                let elapsed = now.duration_since(*oldest);
                if elapsed < self.lockout {
                    return LimitResult::Locked(self.lockout - elapsed);
                }
            }
            attempts.clear();
        }

        if attempts.is_empty() {
            self.attempts.remove(&key);
        }
        LimitResult::Allowed
    }

    /// Record a failed login attempt.
    pub fn record_failure(&mut self, username: &str) {
        let now = Instant::now();
        let window = self.window;
        let attempts = self.attempts.entry(username.to_lowercase()).or_default();

        attempts.retain(|t| now.duration_since(*t) < window);
        attempts.push(now);

        debug!(
            username = %username,
            attempt_count = attempts.len(),
            "Recorded failed login attempt"
        );
    }

    /// Clear all attempts for a username (call on successful login).
    pub fn clear(&mut self, username: &str) {
        self.attempts.remove(&username.to_lowercase());
    }

    /// Get the number of failed attempts for a username.
    pub fn attempt_count(&mut self, username: &str) -> usize {
        let now = Instant::now();
        let window = self.window;
        match self.attempts.get_mut(&username.to_lowercase()) {
            Some(attempts) => {
                attempts.retain(|t| now.duration_since(*t) < window);
                attempts.len()
            }
            None => 0,
        }
    }

    /// Drop usernames whose failures have all aged out of the window.
    ///
    /// Returns how many usernames were dropped.
    pub fn cleanup(&mut self) -> usize {
        let now = Instant::now();
        let window = self.window;
        let before = self.attempts.len();
        self.attempts.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < window);
            !attempts.is_empty()
        });
        before - self.attempts.len()
    }

    /// Number of usernames currently tracked.
    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}

/// Session manager backed by the `sessions` table.
pub struct SessionManager<'a> {
    pool: &'a DbPool,
    ttl_secs: i64,
}

impl<'a> SessionManager<'a> {
    /// Create a session manager issuing sessions of the given lifetime.
    pub fn new(pool: &'a DbPool, ttl_secs: i64) -> Self {
        Self { pool, ttl_secs }
    }

    /// Verify credentials and return the matching active user.
    ///
    /// The limiter lock is never held across an await point.
    pub async fn authenticate(
        &self,
        limiter: &Mutex<LoginLimiter>,
        username: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        let limit = match limiter.lock() {
            Ok(mut guard) => guard.check(username),
            Err(poisoned) => poisoned.into_inner().check(username),
        };
        if let LimitResult::Locked(remaining) = limit {
            warn!(
                username = %username,
                remaining_secs = remaining.as_secs(),
                "Login attempt blocked: account locked"
            );
            return Err(SessionError::AccountLocked(remaining.as_secs().max(1)));
        }

        let user = UserRepository::new(self.pool)
            .get_by_username(username)
            .await?;

        let outcome = match user {
            None => {
                warn!(username = %username, "Login failed: user not found");
                Err(SessionError::InvalidCredentials)
            }
            Some(user) => match crate::auth::verify_password(password, &user.password) {
                Err(_) => {
                    warn!(username = %username, "Login failed: wrong password");
                    Err(SessionError::InvalidCredentials)
                }
                Ok(()) if !user.is_active => {
                    warn!(username = %username, "Login failed: account inactive");
                    Err(SessionError::AccountInactive)
                }
                Ok(()) => Ok(user),
            },
        };

        let mut guard = match limiter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match &outcome {
            Ok(_) => guard.clear(username),
            Err(SessionError::InvalidCredentials) => guard.record_failure(username),
            Err(_) => {}
        }

        outcome
    }

    /// Start a session for an authenticated user and stamp `last_login`.
    pub async fn login(&self, user: &User) -> Result<Session, SessionError> {
        let session = SessionRepository::new(self.pool)
            .create(&NewSession::generate(user.id, self.ttl_secs))
            .await?;
        UserRepository::new(self.pool)
            .update_last_login(user.id)
            .await?;

        info!(
            username = %user.username,
            user_id = user.id,
            "User logged in"
        );
        Ok(session)
    }

    /// End a session. Unknown keys are ignored.
    pub async fn logout(&self, session_key: &str) -> Result<(), SessionError> {
        if SessionRepository::new(self.pool)
            .delete(session_key)
            .await?
        {
            info!("User logged out");
        }
        Ok(())
    }

    /// Resolve a session key to its active user.
    pub async fn current_user(&self, session_key: &str) -> Result<Option<User>, SessionError> {
        let Some(session) = SessionRepository::new(self.pool)
            .get_valid(session_key)
            .await?
        else {
            return Ok(None);
        };

        let user = UserRepository::new(self.pool)
            .get_by_id(session.user_id)
            .await?;
        Ok(user.filter(|u| u.is_active))
    }
}
