//! Account pages: signup, login, logout, password reset, password change
//! and account settings.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use crate::auth::validation::validate_email;
use crate::auth::{
    change_password, register, update_account, AccountUpdateRequest, FieldErrors,
    PasswordChangeError, PasswordResetError, ProfileError, RegistrationError,
    RegistrationRequest, SessionError,
};
use crate::db::{User, UserRepository};
use crate::template::{TemplateContext, Value};
use crate::web::error::WebError;
use crate::web::forms::{
    safe_next, AccountForm, LoginForm, NextQuery, PasswordChangeForm, PasswordResetForm,
    SetPasswordForm, SignupForm,
};
use crate::web::middleware::{removal_cookie, session_cookie, CsrfToken, RequireLogin, SESSION_COOKIE};

use super::{errors_value, AppState, Ids};

type Page = Result<Html<String>, WebError>;

/// Open a session for `user` and attach its cookie.
async fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, WebError> {
    let session = state
        .sessions()
        .login(user)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(jar.add(session_cookie(
        session.session_key,
        state.config.web.secure_cookies,
    )))
}

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

fn signup_context(
    state: &AppState,
    csrf: &CsrfToken,
    form: &SignupForm,
    errors: &FieldErrors,
) -> TemplateContext {
    state
        .page_context("Sign up", None, Some(csrf))
        .with(
            "form",
            Value::object([("username", &form.username), ("email", &form.email)]),
        )
        .with("errors", errors_value(errors))
}

/// GET /signup/
pub async fn signup_page(State(state): State<Arc<AppState>>, csrf: CsrfToken) -> Page {
    let context = signup_context(&state, &csrf, &SignupForm::default(), &FieldErrors::new());
    state.render("signup", &context)
}

/// POST /signup/
///
/// Creates the account, logs it in and goes home.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    csrf: CsrfToken,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, WebError> {
    let request = RegistrationRequest {
        username: form.username.clone(),
        email: form.email.clone(),
        password1: form.password1.clone(),
        password2: form.password2.clone(),
    };

    match register(&UserRepository::new(state.db.pool()), request).await {
        Ok(user) => {
            let jar = start_session(&state, jar, &user).await?;
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(RegistrationError::Invalid(errors)) => {
            let context = signup_context(&state, &csrf, &form, &errors);
            Ok(state.render("signup", &context)?.into_response())
        }
        Err(e) => Err(WebError::internal(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

fn login_context(
    state: &AppState,
    csrf: &CsrfToken,
    username: &str,
    next: &str,
    errors: &FieldErrors,
) -> TemplateContext {
    state
        .page_context("Log in", None, Some(csrf))
        .with("form", Value::object([("username", username)]))
        .with("next", next)
        .with("errors", errors_value(errors))
}

/// GET /login/
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    csrf: CsrfToken,
    Query(query): Query<NextQuery>,
) -> Page {
    let next = query.next.unwrap_or_default();
    let context = login_context(&state, &csrf, "", &next, &FieldErrors::new());
    state.render("login", &context)
}

/// POST /login/
pub async fn login(
    State(state): State<Arc<AppState>>,
    csrf: CsrfToken,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let sessions = state.sessions();
    match sessions
        .authenticate(&state.login_limiter, &form.username, &form.password)
        .await
    {
        Ok(user) => {
            let jar = start_session(&state, jar, &user).await?;
            Ok((jar, Redirect::to(safe_next(&form.next))).into_response())
        }
        Err(SessionError::Database(e)) => Err(WebError::internal(e)),
        Err(e) => {
            let mut errors = FieldErrors::new();
            errors.add(FieldErrors::NON_FIELD, e.to_string());
            let context = login_context(&state, &csrf, &form.username, &form.next, &errors);
            Ok(state.render("login", &context)?.into_response())
        }
    }
}

/// GET /logout/
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response, WebError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state
            .sessions()
            .logout(cookie.value())
            .await
            .map_err(|e| WebError::internal(e.to_string()))?;
    }
    Ok((jar.remove(removal_cookie()), Redirect::to("/")).into_response())
}

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

/// GET /reset/
pub async fn password_reset_page(State(state): State<Arc<AppState>>, csrf: CsrfToken) -> Page {
    let context = state
        .page_context("Reset your password", None, Some(&csrf))
        .with("form", Value::object([("email", "")]))
        .with("errors", errors_value(&FieldErrors::new()));
    state.render("password_reset", &context)
}

/// POST /reset/
///
/// Always lands on the done page so the form does not reveal which
/// addresses have accounts.
pub async fn password_reset(
    State(state): State<Arc<AppState>>,
    csrf: CsrfToken,
    Form(form): Form<PasswordResetForm>,
) -> Result<Response, WebError> {
    let email = form.email.trim();
    if let Err(e) = validate_email(email) {
        let mut errors = FieldErrors::new();
        errors.add("email", e.to_string());
        let context = state
            .page_context("Reset your password", None, Some(&csrf))
            .with("form", Value::object([("email", &form.email)]))
            .with("errors", errors_value(&errors));
        return Ok(state.render("password_reset", &context)?.into_response());
    }

    state
        .password_reset()
        .request_reset(email)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;

    Ok(Redirect::to("/reset/done/").into_response())
}

/// GET /reset/done/
pub async fn password_reset_done(State(state): State<Arc<AppState>>) -> Page {
    let context = state.page_context("Check your email", None, None);
    state.render("password_reset_done", &context)
}

fn reset_confirm_context(
    state: &AppState,
    csrf: &CsrfToken,
    link: Option<(&User, String)>,
    errors: &FieldErrors,
) -> TemplateContext {
    let mut context = state
        .page_context("Reset your password", None, Some(csrf))
        .with("errors", errors_value(errors));
    match link {
        Some((user, action)) => {
            context.set("validlink", true);
            context.set("reset_user", Value::object([("username", &user.username)]));
            context.set("action", action);
        }
        None => context.set("validlink", false),
    }
    context
}

/// GET /reset/:uidb64/:token/
///
/// A bad or expired link still answers 200, with an explanation.
pub async fn password_reset_confirm_page(
    State(state): State<Arc<AppState>>,
    csrf: CsrfToken,
    Ids((uidb64, token)): Ids<(String, String)>,
) -> Page {
    let user = state
        .password_reset()
        .resolve(&uidb64, &token)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;

    let action = format!("/reset/{uidb64}/{token}/");
    let context = reset_confirm_context(
        &state,
        &csrf,
        user.as_ref().map(|u| (u, action)),
        &FieldErrors::new(),
    );
    state.render("password_reset_confirm", &context)
}

/// POST /reset/:uidb64/:token/
pub async fn password_reset_confirm(
    State(state): State<Arc<AppState>>,
    csrf: CsrfToken,
    Ids((uidb64, token)): Ids<(String, String)>,
    Form(form): Form<SetPasswordForm>,
) -> Result<Response, WebError> {
    let service = state.password_reset();
    let result = service
        .confirm(&uidb64, &token, &form.new_password1, &form.new_password2)
        .await;

    let (link_user, errors) = match result {
        Ok(_) => return Ok(Redirect::to("/reset/complete/").into_response()),
        Err(PasswordResetError::InvalidLink) => (None, FieldErrors::new()),
        Err(PasswordResetError::Invalid(errors)) => {
            let user = service
                .resolve(&uidb64, &token)
                .await
                .map_err(|e| WebError::internal(e.to_string()))?;
            (user, errors)
        }
        Err(e) => return Err(WebError::internal(e.to_string())),
    };

    let action = format!("/reset/{uidb64}/{token}/");
    let context = reset_confirm_context(
        &state,
        &csrf,
        link_user.as_ref().map(|u| (u, action)),
        &errors,
    );
    Ok(state.render("password_reset_confirm", &context)?.into_response())
}

/// GET /reset/complete/
pub async fn password_reset_complete(State(state): State<Arc<AppState>>) -> Page {
    let context = state.page_context("Password changed", None, None);
    state.render("password_reset_complete", &context)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// GET /settings/password/
pub async fn password_change_page(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
) -> Page {
    let context = state
        .page_context("Change password", Some(&user), Some(&csrf))
        .with("errors", errors_value(&FieldErrors::new()));
    state.render("password_change", &context)
}

/// POST /settings/password/
///
/// The current session stays valid after the change.
pub async fn password_change(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response, WebError> {
    match change_password(
        state.db.pool(),
        &user,
        &form.old_password,
        &form.new_password1,
        &form.new_password2,
    )
    .await
    {
        Ok(()) => Ok(Redirect::to("/settings/password/done/").into_response()),
        Err(PasswordChangeError::Invalid(errors)) => {
            let context = state
                .page_context("Change password", Some(&user), Some(&csrf))
                .with("errors", errors_value(&errors));
            Ok(state.render("password_change", &context)?.into_response())
        }
        Err(e) => Err(WebError::internal(e.to_string())),
    }
}

/// GET /settings/password/done/
pub async fn password_change_done(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
) -> Page {
    let context = state.page_context("Password changed", Some(&user), None);
    state.render("password_change_done", &context)
}

fn account_context(
    state: &AppState,
    user: &User,
    csrf: &CsrfToken,
    form: &AccountUpdateRequest,
    errors: &FieldErrors,
) -> TemplateContext {
    state
        .page_context("My account", Some(user), Some(csrf))
        .with(
            "form",
            Value::object([
                ("first_name", &form.first_name),
                ("last_name", &form.last_name),
                ("email", &form.email),
            ]),
        )
        .with("errors", errors_value(errors))
}

/// GET /settings/account/
pub async fn my_account_page(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
) -> Page {
    let form = AccountUpdateRequest::from_user(&user);
    let context = account_context(&state, &user, &csrf, &form, &FieldErrors::new());
    state.render("my_account", &context)
}

/// POST /settings/account/
pub async fn my_account(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
    Form(form): Form<AccountForm>,
) -> Result<Response, WebError> {
    let request = AccountUpdateRequest {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
    };

    match update_account(state.db.pool(), &user, &request).await {
        Ok(updated) => {
            info!(user_id = updated.id, "Account settings saved");
            Ok(Redirect::to("/settings/account/").into_response())
        }
        Err(ProfileError::Invalid(errors)) => {
            let context = account_context(&state, &user, &csrf, &request, &errors);
            Ok(state.render("my_account", &context)?.into_response())
        }
        Err(ProfileError::UserNotFound) => {
            warn!(user_id = user.id, "Account vanished during update");
            Err(WebError::NotFound)
        }
        Err(e) => Err(WebError::internal(e.to_string())),
    }
}
