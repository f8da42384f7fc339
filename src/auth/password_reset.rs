//! Password reset by email.
//!
//! A reset request looks up an active account by email and mails it a link
//! of the form `{base_url}/reset/{uidb64}/{token}/`. The link stays valid
//! until the token expires or the account's password, last login or email
//! changes.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::password::PasswordError;
use crate::auth::password_change::{set_password, validate_new_password, PasswordChangeError};
use crate::auth::token::{decode_uid, encode_uid, PasswordResetTokenGenerator};
use crate::auth::validation::FieldErrors;
use crate::config::MailConfig;
use crate::db::{DbPool, User, UserRepository};
use crate::mail::{EmailMessage, MailError, Mailer};

/// Subject of the reset email, without the configured prefix.
pub const RESET_SUBJECT: &str = "Please reset your password";

/// Password reset errors.
#[derive(Error, Debug)]
pub enum PasswordResetError {
    /// The uid/token pair does not identify a user with a valid token.
    #[error("invalid password reset link")]
    InvalidLink,

    /// New password fields failed validation.
    #[error("invalid password: {0}")]
    Invalid(FieldErrors),

    /// Sending the email failed.
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<crate::BoardsError> for PasswordResetError {
    fn from(e: crate::BoardsError) -> Self {
        PasswordResetError::Database(e.to_string())
    }
}

impl From<PasswordChangeError> for PasswordResetError {
    fn from(e: PasswordChangeError) -> Self {
        match e {
            PasswordChangeError::Invalid(fields) => PasswordResetError::Invalid(fields),
            PasswordChangeError::Password(e) => PasswordResetError::Password(e),
            PasswordChangeError::Database(e) => PasswordResetError::Database(e),
        }
    }
}

/// Service handling both halves of the reset flow.
pub struct PasswordResetService<'a> {
    pool: &'a DbPool,
    tokens: &'a PasswordResetTokenGenerator,
    mailer: &'a dyn Mailer,
    mail_config: &'a MailConfig,
    base_url: &'a str,
}

impl<'a> PasswordResetService<'a> {
    pub fn new(
        pool: &'a DbPool,
        tokens: &'a PasswordResetTokenGenerator,
        mailer: &'a dyn Mailer,
        mail_config: &'a MailConfig,
        base_url: &'a str,
    ) -> Self {
        Self {
            pool,
            tokens,
            mailer,
            mail_config,
            base_url,
        }
    }

    /// Absolute confirmation URL for `user` with a fresh token.
    pub fn reset_url(&self, user: &User) -> String {
        format!(
            "{}/reset/{}/{}/",
            self.base_url.trim_end_matches('/'),
            encode_uid(user.id),
            self.tokens.make_token_now(user)
        )
    }

    /// Build the reset email for `user`.
    pub fn build_email(&self, user: &User) -> EmailMessage {
        let body = format!(
            "Hi there,\n\n\
             Someone asked for a password reset for the email address {email}.\n\
             Follow the link below:\n\
             {url}\n\n\
             In case you forgot your username: {username}\n\n\
             If clicking the link above doesn't work, please copy and paste the URL\n\
             in a new browser window instead.\n\n\
             If you've received this mail in error, it's likely that another user\n\
             entered your email address by mistake while trying to reset a password.\n\
             If you didn't initiate the request, you don't need to take any further\n\
             action and can safely disregard this email.\n\n\
             Thanks,\n\n\
             The Django Boards Team\n",
            email = user.email,
            url = self.reset_url(user),
            username = user.username,
        );

        EmailMessage::new(
            &self.mail_config.from,
            &user.email,
            format!("{}{}", self.mail_config.subject_prefix, RESET_SUBJECT),
            body,
        )
    }

    /// Send a reset email to the active account registered under `email`.
    ///
    /// Returns whether a message was sent. An unknown address is not an
    /// error so callers cannot probe for registered emails.
    pub async fn request_reset(&self, email: &str) -> Result<bool, PasswordResetError> {
        let Some(user) = UserRepository::new(self.pool)
            .get_active_by_email(email)
            .await?
        else {
            info!("Password reset requested for unknown email");
            return Ok(false);
        };

        self.mailer.send(&self.build_email(&user))?;
        info!(user_id = user.id, "Password reset email sent");
        Ok(true)
    }

    /// Resolve a reset link to its user, if the link is still valid.
    pub async fn resolve(
        &self,
        uidb64: &str,
        token: &str,
    ) -> Result<Option<User>, PasswordResetError> {
        let Some(user_id) = decode_uid(uidb64) else {
            return Ok(None);
        };
        let Some(user) = UserRepository::new(self.pool).get_by_id(user_id).await? else {
            return Ok(None);
        };

        if self.tokens.check_token_now(&user, token) {
            Ok(Some(user))
        } else {
            warn!(user_id = user.id, "Rejected invalid password reset token");
            Ok(None)
        }
    }

    /// Set a new password through a reset link.
    ///
    /// The link is checked again so a token used once (which changes the
    /// password hash) cannot be replayed.
    pub async fn confirm(
        &self,
        uidb64: &str,
        token: &str,
        new_password1: &str,
        new_password2: &str,
    ) -> Result<User, PasswordResetError> {
        let user = self
            .resolve(uidb64, token)
            .await?
            .ok_or(PasswordResetError::InvalidLink)?;

        let mut errors = FieldErrors::new();
        validate_new_password(&user, new_password1, new_password2, &mut errors);
        errors.into_result().map_err(PasswordResetError::Invalid)?;

        set_password(self.pool, &user, new_password1).await?;
        info!(user_id = user.id, "Password reset completed");
        Ok(user)
    }
}
