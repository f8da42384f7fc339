//! Authentication module for Boards.
//!
//! This module provides password hashing, session management, user
//! registration, password change and reset, account settings and
//! permission checks.

mod password;
mod password_change;
pub mod password_reset;
pub mod permission;
mod profile;
mod registration;
mod session;
pub mod token;
pub mod validation;

pub use password::{
    hash_password, validate_password_length, validate_password_strength, verify_password,
    PasswordError,
};
pub use password_change::{change_password, PasswordChangeError};
pub use password_reset::{PasswordResetError, PasswordResetService};
pub use permission::PermissionError;
pub use profile::{update_account, AccountUpdateRequest, ProfileError};
pub use registration::{register, validate_registration, RegistrationError, RegistrationRequest};
pub use session::{
    LimitResult, LoginLimiter, SessionError, SessionManager, DEFAULT_SESSION_DURATION_SECS,
    LOCKOUT_DURATION_SECS, MAX_LOGIN_ATTEMPTS,
};
pub use token::PasswordResetTokenGenerator;
pub use validation::{FieldErrors, ValidationError};
