//! Page handlers for the web UI.

pub mod accounts;
pub mod boards;

use std::sync::{Arc, Mutex};

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::Html,
};
use serde::de::DeserializeOwned;

use crate::auth::{
    FieldErrors, LoginLimiter, PasswordResetService, PasswordResetTokenGenerator, SessionManager,
};
use crate::board::{BoardService, PaginatedResult};
use crate::config::Config;
use crate::datetime::format_datetime_default;
use crate::db::User;
use crate::mail::Mailer;
use crate::template::{TemplateContext, TemplateEngine, TemplateLoader, Value};
use crate::web::error::WebError;
use crate::web::middleware::CsrfToken;
use crate::Database;

pub use accounts::*;
pub use boards::*;

/// Shared application state for handlers.
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub mailer: Arc<dyn Mailer>,
    pub templates: TemplateEngine,
    pub tokens: PasswordResetTokenGenerator,
    /// Per-username login lockout.
    pub login_limiter: Mutex<LoginLimiter>,
}

impl AppState {
    /// Build the state, loading templates from the binary and the
    /// configured override directory.
    pub fn new(db: Database, config: Config, mailer: Arc<dyn Mailer>) -> crate::Result<Self> {
        let mut loader = TemplateLoader::new();
        if let Some(dir) = &config.site.template_dir {
            loader = loader.with_override_dir(dir);
        }
        let templates = loader.load()?;

        let tokens = PasswordResetTokenGenerator::new(
            config.auth.secret_key.clone(),
            config.auth.password_reset_timeout_secs as i64,
        );
        let login_limiter = Mutex::new(LoginLimiter::with_config(
            config.auth.login_max_attempts,
            config.auth.login_lockout_secs,
        ));

        Ok(Self {
            db,
            config,
            mailer,
            templates,
            tokens,
            login_limiter,
        })
    }

    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(self.db.pool(), self.config.auth.session_expiry_secs as i64)
    }

    pub fn boards(&self) -> BoardService<'_> {
        BoardService::new(&self.db)
    }

    pub fn password_reset(&self) -> PasswordResetService<'_> {
        PasswordResetService::new(
            self.db.pool(),
            &self.tokens,
            self.mailer.as_ref(),
            &self.config.mail,
            &self.config.server.base_url,
        )
    }

    /// Variables every page needs: site name, title, user and CSRF token.
    pub fn page_context(
        &self,
        title: &str,
        user: Option<&User>,
        csrf: Option<&CsrfToken>,
    ) -> TemplateContext {
        let mut context = TemplateContext::new()
            .with("site_name", self.config.site.name.as_str())
            .with("title", title);
        if let Some(user) = user {
            context.set("user", user_value(user));
        }
        if let Some(csrf) = csrf {
            context.set("csrf_token", csrf.as_str());
        }
        context
    }

    /// Render a page inside the layout.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<Html<String>, WebError> {
        Ok(Html(self.templates.render_page(name, context)?))
    }

    /// Timestamp in the site's timezone.
    pub fn local_time(&self, timestamp: &str) -> String {
        format_datetime_default(timestamp, &self.config.site.timezone)
    }
}

/// Path parameters that turn into a 404 when they do not parse, so
/// `/boards/abc/` behaves like a missing board.
pub struct Ids<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Ids<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(ids)| Ids(ids))
            .map_err(|_| WebError::NotFound)
    }
}

/// Template view of an account.
pub fn user_value(user: &User) -> Value {
    Value::object([
        ("id", Value::from(user.id)),
        ("username", Value::from(&user.username)),
        ("email", Value::from(&user.email)),
        ("first_name", Value::from(&user.first_name)),
        ("last_name", Value::from(&user.last_name)),
        ("display_name", Value::from(user.display_name())),
    ])
}

/// Template view of form errors: field name to list of messages.
pub fn errors_value(errors: &FieldErrors) -> Value {
    Value::object(
        errors
            .iter()
            .map(|(field, messages)| (field, Value::from(messages.to_vec()))),
    )
}

/// Template view of a page of results.
pub fn pagination_value<T>(page: &PaginatedResult<T>) -> Value {
    Value::object([
        ("page", Value::from(page.page)),
        ("num_pages", Value::from(page.num_pages())),
        ("has_previous", Value::from(page.has_previous())),
        ("previous_page", Value::from(page.page - 1)),
        ("has_next", Value::from(page.has_more())),
        ("next_page", Value::from(page.page + 1)),
        ("total", Value::from(page.total)),
    ])
}
