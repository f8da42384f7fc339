//! Test helpers for web integration tests.
//!
//! Provides a [`TestApp`] wrapping an axum-test server over an in-memory
//! database and a memory mailer, plus fixtures and HTML helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer, TestServerConfig};

use boards::board::{Board, BoardService, Topic};
use boards::config::Config;
use boards::mail::MemoryMailer;
use boards::web::{create_router, AppState, RateLimitState};
use boards::{hash_password, Database, NewUser, User, UserRepository};

/// Password that passes every strength check.
pub const PASSWORD: &str = "abcdef123456";

/// A running application under test.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub mailer: MemoryMailer,
}

/// Configuration used by tests: CSRF checks off, generous rate limits.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.base_url = "http://testserver".to_string();
    config.auth.secret_key = "test-secret-key".to_string();
    config.mail.backend = "memory".to_string();
    config.web.csrf_enforce = false;
    config.web.reset_rate_limit = 1000;
    config.web.login_rate_limit = 1000;
    config
}

/// Start an app with the test configuration.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Start an app after adjusting the test configuration.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = test_config();
    configure(&mut config);

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let mailer = MemoryMailer::new();
    let rate_limits = Arc::new(
        RateLimitState::new(config.web.reset_rate_limit, config.web.login_rate_limit)
            .with_proxy_headers(config.web.trust_proxy_headers),
    );
    let state = Arc::new(
        AppState::new(db.clone(), config, Arc::new(mailer.clone()))
            .expect("Failed to create app state"),
    );

    let server = TestServer::new_with_config(
        create_router(state, rate_limits),
        TestServerConfig {
            save_cookies: true,
            ..TestServerConfig::default()
        },
    )
    .expect("Failed to create test server");

    TestApp { server, db, mailer }
}

impl TestApp {
    /// Create an active user with [`PASSWORD`].
    pub async fn create_user(&self, username: &str, email: &str) -> User {
        let hash = hash_password(PASSWORD).unwrap();
        UserRepository::new(self.db.pool())
            .create(&NewUser::new(username, email, hash))
            .await
            .unwrap()
    }

    pub async fn create_board(&self, name: &str, description: &str) -> Board {
        BoardService::new(&self.db)
            .create_board(name, description)
            .await
            .unwrap()
    }

    /// Create a topic with its first post.
    pub async fn create_topic(&self, board: &Board, starter: &User, subject: &str) -> Topic {
        BoardService::new(&self.db)
            .create_topic(board.id, starter, subject, "A test message")
            .await
            .unwrap()
    }

    /// Log in through the login form; the session cookie is kept.
    pub async fn login(&self, username: &str) {
        let response = self
            .server
            .post("/login/")
            .form(&[("username", username), ("password", PASSWORD)])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
    }

    pub async fn logout(&self) {
        self.server
            .get("/logout/")
            .await
            .assert_status(StatusCode::SEE_OTHER);
    }
}

/// Value of the `Location` header of a redirect.
pub fn location(response: &TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .unwrap()
        .to_string()
}

/// The CSRF token embedded in a rendered form.
pub fn csrf_token(html: &str) -> String {
    let marker = "name=\"csrfmiddlewaretoken\" value=\"";
    let start = html.find(marker).expect("no CSRF field in page") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

/// Number of times `needle` occurs in `html`.
pub fn count(html: &str, needle: &str) -> usize {
    html.matches(needle).count()
}
