//! Renders [`ErrorPage`] responses into the site layout.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, Request, StatusCode,
    },
    middleware::Next,
    response::Response,
};

use crate::web::error::ErrorPage;
use crate::web::handlers::AppState;

/// Replace the plain body of error responses with the `404` or `error`
/// template. Headers set further in, such as cookies, are kept.
pub async fn error_pages(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let (template, title) = if page.status == StatusCode::NOT_FOUND {
        ("404", "Page not found")
    } else {
        ("error", page.status.canonical_reason().unwrap_or("Error"))
    };

    let mut context = state.page_context(title, None, None);
    context.set("status", i64::from(page.status.as_u16()));
    context.set("message", page.message.as_str());

    let html = match state.templates.render_page(template, &context) {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(error = %e, template, "Failed to render error page");
            return response;
        }
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    Response::from_parts(parts, Body::from(html))
}
