//! Account settings for Boards.
//!
//! Logged-in users may change their first name, last name and email.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_email, validate_name, FieldErrors};
use crate::db::{DbPool, User, UserRepository, UserUpdate};

/// Account update errors.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// One or more fields failed validation.
    #[error("invalid account data: {0}")]
    Invalid(FieldErrors),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<crate::BoardsError> for ProfileError {
    fn from(e: crate::BoardsError) -> Self {
        ProfileError::Database(e.to_string())
    }
}

/// Data submitted on the account settings form.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdateRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl AccountUpdateRequest {
    /// Prefill the form from the current account.
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Validate and store new account settings for `user`.
///
/// The email must be unique among other accounts.
pub async fn update_account(
    pool: &DbPool,
    user: &User,
    request: &AccountUpdateRequest,
) -> Result<User, ProfileError> {
    let repo = UserRepository::new(pool);
    let mut errors = FieldErrors::new();

    errors.check("first_name", validate_name(&request.first_name));
    errors.check("last_name", validate_name(&request.last_name));
    match validate_email(&request.email) {
        Err(e) => errors.add("email", e.to_string()),
        Ok(()) if repo.email_exists(&request.email, Some(user.id)).await? => {
            errors.add("email", "A user with that email already exists.")
        }
        Ok(()) => {}
    }
    errors.into_result().map_err(ProfileError::Invalid)?;

    let update = UserUpdate::new()
        .first_name(request.first_name.trim())
        .last_name(request.last_name.trim())
        .email(request.email.trim());

    let updated = repo
        .update(user.id, &update)
        .await?
        .ok_or(ProfileError::UserNotFound)?;

    info!(user_id = user.id, "Account settings updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;
    use crate::Database;

    async fn setup() -> (Database, User) {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());
        let user = repo
            .create(&NewUser::new("john", "john@doe.com", "pw"))
            .await
            .unwrap();
        repo.create(&NewUser::new("jane", "jane@doe.com", "pw"))
            .await
            .unwrap();
        (db, user)
    }

    #[tokio::test]
    async fn test_update_account() {
        let (db, user) = setup().await;
        let request = AccountUpdateRequest {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "johnny@doe.com".to_string(),
        };

        let updated = update_account(db.pool(), &user, &request).await.unwrap();
        assert_eq!(updated.first_name, "John");
        assert_eq!(updated.last_name, "Doe");
        assert_eq!(updated.email, "johnny@doe.com");
    }

    #[tokio::test]
    async fn test_keeping_own_email_is_allowed() {
        let (db, user) = setup().await;
        let mut request = AccountUpdateRequest::from_user(&user);
        request.first_name = "John".to_string();

        assert!(update_account(db.pool(), &user, &request).await.is_ok());
    }

    #[tokio::test]
    async fn test_email_taken_by_other_user() {
        let (db, user) = setup().await;
        let mut request = AccountUpdateRequest::from_user(&user);
        request.email = "JANE@doe.com".to_string();

        match update_account(db.pool(), &user, &request).await {
            Err(ProfileError::Invalid(errors)) => assert!(errors.has("email")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_fields() {
        let (db, user) = setup().await;
        let request = AccountUpdateRequest {
            first_name: "x".repeat(151),
            last_name: String::new(),
            email: "not-an-email".to_string(),
        };

        match update_account(db.pool(), &user, &request).await {
            Err(ProfileError::Invalid(errors)) => {
                assert!(errors.has("first_name"));
                assert!(!errors.has("last_name"));
                assert!(errors.has("email"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
