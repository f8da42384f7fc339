//! User registration for Boards.

use thiserror::Error;
use tracing::info;

use crate::auth::password::{hash_password, validate_password_strength, PasswordError};
use crate::auth::validation::{
    validate_email, validate_password_pair, validate_username, FieldErrors,
};
use crate::db::{NewUser, User, UserRepository};

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// One or more fields failed validation.
    #[error("invalid registration: {0}")]
    Invalid(FieldErrors),

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<crate::BoardsError> for RegistrationError {
    fn from(e: crate::BoardsError) -> Self {
        RegistrationError::Database(e.to_string())
    }
}

/// Registration request data, as submitted on the signup form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

impl RegistrationRequest {
    /// Create a new registration request with a confirmed password.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            username: username.into(),
            email: email.into(),
            password2: password.clone(),
            password1: password,
        }
    }
}

/// Check every signup field, including uniqueness against the database.
///
/// Password mismatch and strength problems are reported on `password2`.
pub async fn validate_registration(
    repo: &UserRepository<'_>,
    request: &RegistrationRequest,
) -> Result<(), RegistrationError> {
    let mut errors = FieldErrors::new();

    match validate_username(&request.username) {
        Err(e) => errors.add("username", e.to_string()),
        Ok(()) if repo.username_exists(&request.username).await? => {
            errors.add("username", "A user with that username already exists.")
        }
        Ok(()) => {}
    }

    match validate_email(&request.email) {
        Err(e) => errors.add("email", e.to_string()),
        Ok(()) if repo.email_exists(&request.email, None).await? => {
            errors.add("email", "A user with that email already exists.")
        }
        Ok(()) => {}
    }

    if request.password1.is_empty() {
        errors.add("password1", "This field is required.");
    }
    match validate_password_pair(&request.password1, &request.password2) {
        Err(e) => errors.add("password2", e.to_string()),
        Ok(()) => {
            let attributes = [
                ("username", request.username.as_str()),
                ("email address", request.email.as_str()),
            ];
            if let Err(problems) = validate_password_strength(&request.password2, &attributes) {
                for problem in problems {
                    errors.add("password2", problem.to_string());
                }
            }
        }
    }

    errors.into_result().map_err(RegistrationError::Invalid)
}

/// Register a new user.
///
/// This function:
/// 1. Validates all input fields
/// 2. Checks that username and email are unused
/// 3. Hashes the password
/// 4. Creates the user in the database
///
/// Nothing is written when validation fails.
pub async fn register(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
) -> Result<User, RegistrationError> {
    validate_registration(repo, &request).await?;

    let password_hash = hash_password(&request.password1)?;
    let user = repo
        .create(&NewUser::new(&request.username, &request.email, password_hash))
        .await?;

    info!(
        username = %user.username,
        user_id = user.id,
        "New user registered"
    );

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn invalid_fields(err: RegistrationError) -> FieldErrors {
        match err {
            RegistrationError::Invalid(fields) => fields,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let request = RegistrationRequest::new("john", "john@doe.com", "abcdef123456");
        let user = register(&repo, request).await.unwrap();

        assert_eq!(user.username, "john");
        assert_eq!(user.email, "john@doe.com");
        assert!(user.password.starts_with("$argon2id$"));
        assert!(verify_password("abcdef123456", &user.password).is_ok());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_empty_form() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let err = register(&repo, RegistrationRequest::default())
            .await
            .unwrap_err();
        let fields = invalid_fields(err);

        assert!(fields.has("username"));
        assert!(fields.has("email"));
        assert!(fields.has("password1"));
        assert!(fields.has("password2"));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_username_and_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        register(
            &repo,
            RegistrationRequest::new("john", "john@doe.com", "abcdef123456"),
        )
        .await
        .unwrap();

        let err = register(
            &repo,
            RegistrationRequest::new("John", "JOHN@doe.com", "abcdef123456"),
        )
        .await
        .unwrap_err();
        let fields = invalid_fields(err);

        assert_eq!(
            fields.get("username"),
            ["A user with that username already exists."]
        );
        assert_eq!(fields.get("email"), ["A user with that email already exists."]);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let mut request = RegistrationRequest::new("john", "john@doe.com", "abcdef123456");
        request.password2 = "abcdef654321".to_string();

        let fields = invalid_fields(register(&repo, request).await.unwrap_err());
        assert_eq!(
            fields.get("password2"),
            ["The two password fields didn't match."]
        );
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let request = RegistrationRequest::new("john", "john@doe.com", "1234");
        let fields = invalid_fields(register(&repo, request).await.unwrap_err());

        assert!(fields.get("password2").len() >= 2);
        assert!(!fields.has("username"));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_invalid_username() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let request = RegistrationRequest::new("john doe", "john@doe.com", "abcdef123456");
        let fields = invalid_fields(register(&repo, request).await.unwrap_err());
        assert!(fields.has("username"));
    }
}
