//! Input validation for account fields.
//!
//! This module provides validation functions for usernames, email addresses
//! and names.

use std::collections::BTreeMap;

use thiserror::Error;
use validator::ValidateEmail;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum name length (first or last).
pub const MAX_NAME_LENGTH: usize = 150;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("This field is required.")]
    Required,

    /// Username is too long.
    #[error("Ensure this value has at most {MAX_USERNAME_LENGTH} characters.")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error(
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
    )]
    UsernameInvalidChars,

    /// Email is too long.
    #[error("Ensure this value has at most {MAX_EMAIL_LENGTH} characters.")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("Enter a valid email address.")]
    EmailInvalidFormat,

    /// A name field is too long.
    #[error("Ensure this value has at most {MAX_NAME_LENGTH} characters.")]
    NameTooLong,

    /// The two password fields differ.
    #[error("The two password fields didn't match.")]
    PasswordMismatch,
}

/// Error messages keyed by form field name.
///
/// Errors not tied to one field are stored under [`FieldErrors::NON_FIELD`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Key for errors that concern the form as a whole.
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error message for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record the error of a failed check, if any.
    pub fn check<E: std::fmt::Display>(&mut self, field: &str, result: Result<(), E>) {
        if let Err(e) = result {
            self.add(field, e.to_string());
        }
    }

    /// Messages recorded for a field.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(field, messages)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validate a username.
///
/// Requirements:
/// - Not empty, at most 150 characters
/// - Characters: letters, digits and `@ . + - _`
///
/// # Examples
///
/// ```
/// use boards::auth::validation::validate_username;
///
/// assert!(validate_username("john.doe+forum@home").is_ok());
/// assert!(validate_username("john doe").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Required);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate a required email address.
///
/// ```
/// use boards::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Required);
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if !email.validate_email() {
        return Err(ValidationError::EmailInvalidFormat);
    }
    Ok(())
}

/// Validate an optional first or last name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

/// Check that a password and its confirmation are present and equal.
pub fn validate_password_pair(password1: &str, password2: &str) -> Result<(), ValidationError> {
    if password1.is_empty() || password2.is_empty() {
        return Err(ValidationError::Required);
    }
    if password1 != password2 {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
