//! Configuration module for Boards.

use serde::Deserialize;
use std::path::Path;

use crate::{BoardsError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used when building absolute links (e.g. in emails).
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/boards.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Site information.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Name shown in page titles and the navigation bar.
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Timezone used to display timestamps (e.g. "UTC", "Europe/Lisbon").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Directory with `*.html` files overriding the built-in templates.
    #[serde(default)]
    pub template_dir: Option<String>,
}

fn default_site_name() -> String {
    "Django Boards".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            timezone: default_timezone(),
            template_dir: None,
        }
    }
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Mail backend: "memory", "console" or "file".
    #[serde(default = "default_mail_backend")]
    pub backend: String,
    /// Sender address.
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Directory for the file backend.
    #[serde(default = "default_mail_file_path")]
    pub file_path: String,
    /// Prefix prepended to every subject.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_mail_backend() -> String {
    "console".to_string()
}

fn default_mail_from() -> String {
    "Django Boards <noreply@djangoboards.com>".to_string()
}

fn default_mail_file_path() -> String {
    "data/mail".to_string()
}

fn default_subject_prefix() -> String {
    "[Django Boards] ".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: default_mail_backend(),
            from: default_mail_from(),
            file_path: default_mail_file_path(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign password reset tokens (must be set).
    #[serde(default)]
    pub secret_key: String,
    /// Lifetime of a password reset link in seconds.
    #[serde(default = "default_password_reset_timeout")]
    pub password_reset_timeout_secs: u64,
    /// Lifetime of a login session in seconds.
    #[serde(default = "default_session_expiry")]
    pub session_expiry_secs: u64,
    /// Failed logins allowed before the username is locked.
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,
    /// Lockout duration in seconds.
    #[serde(default = "default_login_lockout")]
    pub login_lockout_secs: u64,
}

fn default_password_reset_timeout() -> u64 {
    3 * 24 * 60 * 60 // 3 days
}

fn default_session_expiry() -> u64 {
    crate::auth::DEFAULT_SESSION_DURATION_SECS as u64
}

fn default_login_max_attempts() -> u32 {
    5
}

fn default_login_lockout() -> u64 {
    300 // 5 minutes
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            password_reset_timeout_secs: default_password_reset_timeout(),
            session_expiry_secs: default_session_expiry(),
            login_max_attempts: default_login_max_attempts(),
            login_lockout_secs: default_login_lockout(),
        }
    }
}

/// Web front-end configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Reject POST requests whose CSRF token does not match the cookie.
    #[serde(default = "default_csrf_enforce")]
    pub csrf_enforce: bool,
    /// Mark cookies as `Secure` (HTTPS only).
    #[serde(default)]
    pub secure_cookies: bool,
    /// Password reset requests allowed per client IP per minute.
    #[serde(default = "default_reset_rate_limit")]
    pub reset_rate_limit: u32,
    /// Login attempts allowed per client IP per minute.
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Count clients by `X-Forwarded-For`/`X-Real-IP`. Enable only behind
    /// a reverse proxy that sets those headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
    /// Topics shown per page in a board.
    #[serde(default = "default_topics_per_page")]
    pub topics_per_page: i64,
    /// Posts shown per page in a topic.
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: i64,
}

fn default_csrf_enforce() -> bool {
    true
}

fn default_reset_rate_limit() -> u32 {
    5
}

fn default_login_rate_limit() -> u32 {
    20
}

fn default_topics_per_page() -> i64 {
    20
}

fn default_posts_per_page() -> i64 {
    20
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            csrf_enforce: default_csrf_enforce(),
            secure_cookies: false,
            reset_rate_limit: default_reset_rate_limit(),
            login_rate_limit: default_login_rate_limit(),
            trust_proxy_headers: false,
            topics_per_page: default_topics_per_page(),
            posts_per_page: default_posts_per_page(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/boards.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Site information.
    #[serde(default)]
    pub site: SiteConfig,
    /// Outbound mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Web front-end configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BoardsError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BoardsError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `BOARDS_SECRET_KEY`: Override the token signing secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("BOARDS_SECRET_KEY") {
            if !secret.is_empty() {
                self.auth.secret_key = secret;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret_key.is_empty() {
            return Err(BoardsError::Config(
                "secret_key is not set. \
                 Set it in config.toml or via BOARDS_SECRET_KEY environment variable."
                    .to_string(),
            ));
        }
        if !matches!(self.mail.backend.as_str(), "memory" | "console" | "file") {
            return Err(BoardsError::Config(format!(
                "unknown mail backend: {}",
                self.mail.backend
            )));
        }
        if url::Url::parse(&self.server.base_url).is_err() {
            return Err(BoardsError::Config(format!(
                "invalid base_url: {}",
                self.server.base_url
            )));
        }
        Ok(())
    }
}
