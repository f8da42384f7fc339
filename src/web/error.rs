//! Error pages for the Boards web UI.
//!
//! Handlers return [`WebError`]; it becomes a response carrying an
//! [`ErrorPage`] extension, which the `error_pages` middleware renders into
//! the site layout.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::BoardsError;

/// Web error type.
#[derive(Debug)]
pub enum WebError {
    /// 404, also used for objects the user may not touch.
    NotFound,
    /// 403.
    Forbidden(String),
    /// 429.
    TooManyRequests(String),
    /// 500. The message is logged, never shown.
    Internal(String),
}

impl WebError {
    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        WebError::Internal(message.into())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::Forbidden(_) => StatusCode::FORBIDDEN,
            WebError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the visitor.
    pub fn public_message(&self) -> String {
        match self {
            WebError::NotFound => "Page not found".to_string(),
            WebError::Forbidden(msg) | WebError::TooManyRequests(msg) => msg.clone(),
            WebError::Internal(_) => "Something went wrong on our side.".to_string(),
        }
    }
}

/// Marker attached to error responses so the layout can be applied later.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if let WebError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal error");
        }

        let status = self.status_code();
        let message = self.public_message();
        let fallback = Html(format!(
            "<h1>{}</h1><p>{}</p>",
            status.as_u16(),
            crate::template::escape_html(&message)
        ));

        let mut response = (status, fallback).into_response();
        response
            .extensions_mut()
            .insert(ErrorPage { status, message });
        response
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebError::Internal(detail) => write!(f, "{}: {detail}", self.status_code()),
            _ => write!(f, "{}: {}", self.status_code(), self.public_message()),
        }
    }
}

impl std::error::Error for WebError {}

impl From<BoardsError> for WebError {
    fn from(err: BoardsError) -> Self {
        match err {
            BoardsError::NotFound(_) => WebError::NotFound,
            BoardsError::Permission(msg) => WebError::Forbidden(msg),
            other => WebError::Internal(other.to_string()),
        }
    }
}

impl From<crate::template::TemplateError> for WebError {
    fn from(err: crate::template::TemplateError) -> Self {
        WebError::Internal(err.to_string())
    }
}
