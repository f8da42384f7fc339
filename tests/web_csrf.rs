//! CSRF protection tests with enforcement switched on.

mod common;

use axum::http::StatusCode;
use boards::UserRepository;

use common::{csrf_token, spawn_app_with, PASSWORD};

#[tokio::test]
async fn test_post_without_token_is_forbidden() {
    let app = spawn_app_with(|config| config.web.csrf_enforce = true).await;

    let response = app
        .server
        .post("/signup/")
        .form(&[
            ("username", "john"),
            ("email", "john@doe.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(UserRepository::new(app.db.pool()).count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_post_with_wrong_token_is_forbidden() {
    let app = spawn_app_with(|config| config.web.csrf_enforce = true).await;
    app.server.get("/signup/").await.assert_status_ok();

    app.server
        .post("/signup/")
        .form(&[("csrfmiddlewaretoken", "forged"), ("username", "john")])
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_post_with_page_token_succeeds() {
    let app = spawn_app_with(|config| config.web.csrf_enforce = true).await;

    let page = app.server.get("/signup/").await;
    page.assert_status_ok();
    let token = csrf_token(&page.text());

    let response = app
        .server
        .post("/signup/")
        .form(&[
            ("csrfmiddlewaretoken", token.as_str()),
            ("username", "john"),
            ("email", "john@doe.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert!(UserRepository::new(app.db.pool())
        .username_exists("john")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_safe_methods_are_not_checked() {
    let app = spawn_app_with(|config| config.web.csrf_enforce = true).await;

    app.server.get("/").await.assert_status_ok();
    app.server.get("/login/").await.assert_status_ok();
}
