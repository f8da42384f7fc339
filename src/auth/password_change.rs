//! Password change for logged-in users.

use thiserror::Error;
use tracing::info;

use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, PasswordError,
};
use crate::auth::validation::{validate_password_pair, FieldErrors};
use crate::db::{DbPool, User, UserRepository};

/// Password change errors.
#[derive(Error, Debug)]
pub enum PasswordChangeError {
    /// One or more fields failed validation.
    #[error("invalid password change: {0}")]
    Invalid(FieldErrors),

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<crate::BoardsError> for PasswordChangeError {
    fn from(e: crate::BoardsError) -> Self {
        PasswordChangeError::Database(e.to_string())
    }
}

/// Check a new password and its confirmation for `user`.
///
/// Errors are recorded on `new_password1` (missing) and `new_password2`
/// (mismatch or strength).
pub fn validate_new_password(
    user: &User,
    new_password1: &str,
    new_password2: &str,
    errors: &mut FieldErrors,
) {
    if new_password1.is_empty() {
        errors.add("new_password1", "This field is required.");
    }
    match validate_password_pair(new_password1, new_password2) {
        Err(e) => errors.add("new_password2", e.to_string()),
        Ok(()) => {
            let attributes = [
                ("username", user.username.as_str()),
                ("first name", user.first_name.as_str()),
                ("last name", user.last_name.as_str()),
                ("email address", user.email.as_str()),
            ];
            if let Err(problems) = validate_password_strength(new_password2, &attributes) {
                for problem in problems {
                    errors.add("new_password2", problem.to_string());
                }
            }
        }
    }
}

/// Hash and store a new password for `user`.
pub async fn set_password(
    pool: &DbPool,
    user: &User,
    new_password: &str,
) -> Result<(), PasswordChangeError> {
    let hash = hash_password(new_password)?;
    UserRepository::new(pool).set_password(user.id, &hash).await?;
    info!(username = %user.username, user_id = user.id, "Password updated");
    Ok(())
}

/// Change the password of a logged-in user after checking the old one.
///
/// Existing sessions are left untouched.
pub async fn change_password(
    pool: &DbPool,
    user: &User,
    old_password: &str,
    new_password1: &str,
    new_password2: &str,
) -> Result<(), PasswordChangeError> {
    let mut errors = FieldErrors::new();

    if old_password.is_empty() {
        errors.add("old_password", "This field is required.");
    } else if verify_password(old_password, &user.password).is_err() {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }
    validate_new_password(user, new_password1, new_password2, &mut errors);

    errors
        .into_result()
        .map_err(PasswordChangeError::Invalid)?;
    set_password(pool, user, new_password1).await
}
