//! User model for Boards.

use sqlx::FromRow;

/// User entity representing a registered account.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Email address (unique, case-insensitive).
    pub email: String,
    /// Password hash (Argon2 PHC string).
    pub password: String,
    /// Given name, may be empty.
    pub first_name: String,
    /// Family name, may be empty.
    pub last_name: String,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Account creation timestamp.
    pub date_joined: String,
    /// Last login timestamp.
    pub last_login: Option<String>,
}

impl User {
    /// Full name, falling back to the username when no name is set.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    /// Create a new user with the required fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    /// Set the first and last name.
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }
}

/// Data for updating an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New password hash.
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new password hash.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set new email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set new first name.
    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Set new last name.
    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Set active status.
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.is_active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "john".to_string(),
            email: "john@doe.com".to_string(),
            password: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            date_joined: "2024-01-01 00:00:00".to_string(),
            last_login: None,
        }
    }

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new("john", "john@doe.com", "hash").with_name("John", "Doe");

        assert_eq!(user.username, "john");
        assert_eq!(user.email, "john@doe.com");
        assert_eq!(user.password, "hash");
        assert_eq!(user.first_name, "John");
        assert_eq!(user.last_name, "Doe");
    }

    #[test]
    fn test_user_update_builder() {
        let update = UserUpdate::new().first_name("John").is_active(false);

        assert!(update.first_name.is_some());
        assert!(update.is_active.is_some());
        assert!(update.password.is_none());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_user_update_empty() {
        assert!(UserUpdate::new().is_empty());
    }

    #[test]
    fn test_display_name() {
        let mut user = sample_user();
        assert_eq!(user.display_name(), "john");

        user.first_name = "John".to_string();
        assert_eq!(user.display_name(), "John");

        user.last_name = "Doe".to_string();
        assert_eq!(user.display_name(), "John Doe");
    }
}
