//! Permission checking for Boards.
//!
//! Any active user may read, start topics and reply; only the author of a
//! post may edit it.

use thiserror::Error;

use crate::db::User;

/// Permission-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// User is not authenticated.
    #[error("this action requires login")]
    NotAuthenticated,

    /// User account is not active.
    #[error("account is inactive")]
    AccountInactive,

    /// User does not own the resource.
    #[error("only the author may modify this resource")]
    NotOwner,
}

/// Require an authenticated, active user.
///
/// # Examples
///
/// ```
/// use boards::auth::permission::{require_login, PermissionError};
///
/// assert!(matches!(require_login(None), Err(PermissionError::NotAuthenticated)));
/// ```
pub fn require_login(user: Option<&User>) -> Result<&User, PermissionError> {
    let user = user.ok_or(PermissionError::NotAuthenticated)?;
    if !user.is_active {
        return Err(PermissionError::AccountInactive);
    }
    Ok(user)
}

/// Check if a user may modify a resource created by `owner_id`.
///
/// Rules:
/// - The user must be logged in and active
/// - The user must be the owner
pub fn can_modify_resource(user: Option<&User>, owner_id: i64) -> Result<(), PermissionError> {
    let user = require_login(user)?;
    if user.id != owner_id {
        return Err(PermissionError::NotOwner);
    }
    Ok(())
}
