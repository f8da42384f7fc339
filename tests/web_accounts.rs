//! Login, logout, password change and account settings tests.

mod common;

use axum::http::StatusCode;
use boards::{verify_password, UserRepository};

use common::{location, spawn_app, PASSWORD};

const NEW_PASSWORD: &str = "new_password_42";

// ============================================================================
// Login / logout
// ============================================================================

#[tokio::test]
async fn test_login_page_renders_form() {
    let app = spawn_app().await;

    let response = app.server.get("/login/?next=/boards/1/").await;
    response.assert_status_ok();

    let html = response.text();
    assert!(html.contains("csrfmiddlewaretoken"));
    assert!(html.contains("name=\"next\" value=\"/boards/1/\""));
    assert!(html.contains("href=\"/reset/\""));
}

#[tokio::test]
async fn test_bad_credentials_rerender_with_error() {
    let app = spawn_app().await;
    app.create_user("john", "john@doe.com").await;

    let response = app
        .server
        .post("/login/")
        .form(&[("username", "john"), ("password", "wrong-password")])
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Please enter a correct username and password."));
    assert!(html.contains("value=\"john\""));
}

#[tokio::test]
async fn test_login_follows_safe_next() {
    let app = spawn_app().await;
    app.create_user("john", "john@doe.com").await;

    let response = app
        .server
        .post("/login/")
        .form(&[
            ("username", "john"),
            ("password", PASSWORD),
            ("next", "/settings/account/"),
        ])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/settings/account/");
    app.server
        .get("/settings/account/")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let app = spawn_app().await;
    app.create_user("john", "john@doe.com").await;

    let response = app
        .server
        .post("/login/")
        .form(&[
            ("username", "john"),
            ("password", PASSWORD),
            ("next", "//evil.example.com/"),
        ])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_login_ignores_next_with_control_characters() {
    let app = spawn_app().await;
    app.create_user("john", "john@doe.com").await;

    for next in ["/\t/evil.example.com", "/a\u{1}b", "/\r\n/evil.example.com"] {
        let response = app
            .server
            .post("/login/")
            .form(&[("username", "john"), ("password", PASSWORD), ("next", next)])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/", "{next:?}");
    }
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account() {
    let app = spawn_app().await;
    app.create_user("john", "john@doe.com").await;

    for _ in 0..5 {
        app.server
            .post("/login/")
            .form(&[("username", "john"), ("password", "wrong-password")])
            .await
            .assert_status_ok();
    }

    // Even the right password is refused while locked, but the page still works.
    let response = app
        .server
        .post("/login/")
        .form(&[("username", "john"), ("password", PASSWORD)])
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("Too many failed login attempts."));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = spawn_app().await;
    app.create_user("john", "john@doe.com").await;
    app.login("john").await;
    app.server
        .get("/settings/account/")
        .await
        .assert_status_ok();

    let response = app.server.get("/logout/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.server.get("/settings/account/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/settings/account/");
}

// ============================================================================
// Password change
// ============================================================================

#[tokio::test]
async fn test_password_change_requires_login() {
    let app = spawn_app().await;

    let response = app.server.get("/settings/password/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/settings/password/");
}

#[tokio::test]
async fn test_password_change_keeps_session() {
    let app = spawn_app().await;
    let user = app.create_user("john", "john@doe.com").await;
    app.login("john").await;

    let response = app
        .server
        .post("/settings/password/")
        .form(&[
            ("old_password", PASSWORD),
            ("new_password1", NEW_PASSWORD),
            ("new_password2", NEW_PASSWORD),
        ])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/settings/password/done/");

    app.server
        .get("/settings/password/done/")
        .await
        .assert_status_ok();

    let stored = UserRepository::new(app.db.pool())
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password(NEW_PASSWORD, &stored.password).is_ok());
    assert!(verify_password(PASSWORD, &stored.password).is_err());
}

#[tokio::test]
async fn test_password_change_with_wrong_old_password() {
    let app = spawn_app().await;
    let user = app.create_user("john", "john@doe.com").await;
    app.login("john").await;

    let response = app
        .server
        .post("/settings/password/")
        .form(&[
            ("old_password", "not-my-password"),
            ("new_password1", NEW_PASSWORD),
            ("new_password2", NEW_PASSWORD),
        ])
        .await;

    response.assert_status_ok();
    assert!(response
        .text()
        .contains("Your old password was entered incorrectly."));

    let stored = UserRepository::new(app.db.pool())
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.password, user.password);
}

// ============================================================================
// Account settings
// ============================================================================

#[tokio::test]
async fn test_account_page_shows_current_values() {
    let app = spawn_app().await;
    app.create_user("john", "john@doe.com").await;
    app.login("john").await;

    let response = app.server.get("/settings/account/").await;
    response.assert_status_ok();
    assert!(response.text().contains("value=\"john@doe.com\""));
}

#[tokio::test]
async fn test_account_update_saves_and_redirects() {
    let app = spawn_app().await;
    let user = app.create_user("john", "john@doe.com").await;
    app.login("john").await;

    let response = app
        .server
        .post("/settings/account/")
        .form(&[
            ("first_name", "John"),
            ("last_name", "Doe"),
            ("email", "johnny@doe.com"),
        ])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/settings/account/");

    let stored = UserRepository::new(app.db.pool())
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.first_name, "John");
    assert_eq!(stored.last_name, "Doe");
    assert_eq!(stored.email, "johnny@doe.com");
}

#[tokio::test]
async fn test_account_update_rejects_taken_email() {
    let app = spawn_app().await;
    let user = app.create_user("john", "john@doe.com").await;
    app.create_user("jane", "jane@doe.com").await;
    app.login("john").await;

    let response = app
        .server
        .post("/settings/account/")
        .form(&[
            ("first_name", ""),
            ("last_name", ""),
            ("email", "jane@doe.com"),
        ])
        .await;

    response.assert_status_ok();
    assert!(response
        .text()
        .contains("A user with that email already exists."));

    let stored = UserRepository::new(app.db.pool())
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.email, "john@doe.com");
}
