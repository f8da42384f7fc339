//! Router configuration for the web UI.

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::error::WebError;
use super::handlers::{
    board_topics, edit_post, edit_post_page, home, login, login_page, logout, my_account,
    my_account_page, new_topic, new_topic_page, password_change, password_change_done,
    password_change_page, password_reset, password_reset_complete, password_reset_confirm,
    password_reset_confirm_page, password_reset_done, password_reset_page, reply_topic,
    reply_topic_page, signup, signup_page, topic_posts, AppState,
};
use super::middleware::{
    csrf_protect, error_pages, login_rate_limit, reset_rate_limit, security_headers,
    RateLimitState,
};

/// Create the site router.
pub fn create_router(app_state: Arc<AppState>, rate_limits: Arc<RateLimitState>) -> Router {
    let reset_limits = rate_limits.clone();
    let reset_routes = Router::new().route(
        "/reset/",
        get(password_reset_page)
            .post(password_reset)
            .layer(middleware::from_fn(move |req, next| {
                reset_rate_limit(reset_limits.clone(), req, next)
            })),
    );

    let login_limits = rate_limits;
    let login_routes = Router::new().route(
        "/login/",
        get(login_page)
            .post(login)
            .layer(middleware::from_fn(move |req, next| {
                login_rate_limit(login_limits.clone(), req, next)
            })),
    );

    let account_routes = Router::new()
        .route("/signup/", get(signup_page).post(signup))
        .route("/logout/", get(logout))
        .route("/reset/done/", get(password_reset_done))
        .route("/reset/complete/", get(password_reset_complete))
        .route(
            "/reset/:uidb64/:token/",
            get(password_reset_confirm_page).post(password_reset_confirm),
        )
        .route(
            "/settings/password/",
            get(password_change_page).post(password_change),
        )
        .route("/settings/password/done/", get(password_change_done))
        .route("/settings/account/", get(my_account_page).post(my_account));

    let board_routes = Router::new()
        .route("/", get(home))
        .route("/boards/:id/", get(board_topics))
        .route("/boards/:id/new/", get(new_topic_page).post(new_topic))
        .route("/boards/:id/topics/:topic_id/", get(topic_posts))
        .route(
            "/boards/:id/topics/:topic_id/reply/",
            get(reply_topic_page).post(reply_topic),
        )
        .route(
            "/boards/:id/topics/:topic_id/posts/:post_id/edit/",
            get(edit_post_page).post(edit_post),
        );

    Router::new()
        .merge(reset_routes)
        .merge(login_routes)
        .merge(account_routes)
        .merge(board_routes)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    error_pages,
                ))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    csrf_protect,
                )),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> WebError {
    WebError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::mail::MemoryMailer;
    use crate::Database;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::open_in_memory().await.unwrap();
        let state =
            Arc::new(AppState::new(db, Config::default(), Arc::new(MemoryMailer::new())).unwrap());
        create_router(state, Arc::new(RateLimitState::new(5, 5))).merge(create_health_router())
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_router()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_path_renders_404_page() {
        let response = test_router()
            .await
            .oneshot(Request::get("/no/such/page/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Page not found"));
        assert!(html.contains("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn test_first_visit_sets_csrf_cookie() {
        let response = test_router()
            .await
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("csrftoken="));
    }
}
