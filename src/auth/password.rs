//! Password hashing and strength checks for Boards.
//!
//! Uses Argon2id for password hashing.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand_core::OsRng;
use thiserror::Error;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Similarity ratio above which a password is rejected as too close to a
/// user attribute.
pub const MAX_SIMILARITY: f64 = 0.7;

/// Passwords rejected regardless of length.
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password12",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwertyuiop",
    "qwerty123",
    "iloveyou",
    "sunshine",
    "princess",
    "football",
    "baseball",
    "welcome1",
    "trustno1",
    "superman",
    "starwars",
    "letmein1",
    "abc12345",
    "passw0rd",
    "11111111",
    "00000000",
    "asdfghjkl",
    "zaq12wsx",
    "changeme",
];

/// Password-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Password is too short.
    #[error("This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters.")]
    TooShort,

    /// Password is too long.
    #[error("This password is too long. It must contain at most {MAX_PASSWORD_LENGTH} characters.")]
    TooLong,

    /// Password is made of digits only.
    #[error("This password is entirely numeric.")]
    EntirelyNumeric,

    /// Password appears in the common password list.
    #[error("This password is too common.")]
    TooCommon,

    /// Password is too close to a user attribute.
    #[error("The password is too similar to the {0}.")]
    TooSimilar(&'static str),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Password hash is invalid.
    #[error("invalid password hash format")]
    InvalidHash,

    /// Password verification failed (wrong password).
    #[error("password verification failed")]
    VerificationFailed,
}

/// Create the Argon2id hasher.
///
/// Parameters: 19 MiB memory, 2 iterations, 1 lane.
fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params =
        Params::new(19_456, 2, 1, None).map_err(|e| PasswordError::HashError(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password using Argon2id.
///
/// Returns a PHC-formatted hash string that includes the salt and parameters.
/// Only length is checked here; strength rules belong to
/// [`validate_password_strength`].
///
/// # Examples
///
/// ```
/// use boards::auth::hash_password;
///
/// let hash = hash_password("my_secure_password").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    validate_password_length(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let hash = create_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// ```
/// use boards::auth::{hash_password, verify_password};
///
/// let hash = hash_password("my_secure_password").unwrap();
/// assert!(verify_password("my_secure_password", &hash).is_ok());
/// assert!(verify_password("wrong_password", &hash).is_err());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    // Parameters come from the parsed hash.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

/// Check password length bounds.
pub fn validate_password_length(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

/// Run every strength rule against a password.
///
/// `attributes` pairs a label ("username", "email address") with the user's
/// value for it. All failing rules are reported.
///
/// ```
/// use boards::auth::validate_password_strength;
///
/// let attrs = [("username", "john"), ("email address", "john@doe.com")];
/// assert!(validate_password_strength("abcdef123456", &attrs).is_ok());
/// assert!(validate_password_strength("12345", &attrs).is_err());
/// ```
pub fn validate_password_strength(
    password: &str,
    attributes: &[(&'static str, &str)],
) -> Result<(), Vec<PasswordError>> {
    let mut errors = Vec::new();

    if let Some(label) = attributes
        .iter()
        .find(|(_, value)| is_too_similar(password, value))
        .map(|(label, _)| *label)
    {
        errors.push(PasswordError::TooSimilar(label));
    }
    if let Err(e) = validate_password_length(password) {
        errors.push(e);
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().trim()) {
        errors.push(PasswordError::TooCommon);
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.push(PasswordError::EntirelyNumeric);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether a password is too close to an attribute value or to any of its
/// word-like parts.
fn is_too_similar(password: &str, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let password = password.to_lowercase();
    let value = value.to_lowercase();

    std::iter::once(value.as_str())
        .chain(value.split(|c: char| !c.is_alphanumeric()))
        .filter(|part| !part.is_empty())
        .any(|part| similarity(&password, part) >= MAX_SIMILARITY)
}

/// Similarity ratio `2 * M / T` where `M` is the length of the longest
/// common subsequence and `T` the combined length.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut curr = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        prev = curr;
    }

    2.0 * prev[b.len()] as f64 / total as f64
}
