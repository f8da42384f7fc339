//! Boards - a multi-user discussion forum.
//!
//! Boards hold topics, topics hold posts. Visitors browse; registered users
//! start topics, reply and edit their own posts. Accounts support signup,
//! login, password change and password reset by email. Pages are rendered
//! on the server and served over axum.

pub mod auth;
pub mod board;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod template;
pub mod web;

pub use auth::{
    change_password, hash_password, register, update_account, verify_password,
    AccountUpdateRequest, FieldErrors, LoginLimiter, PasswordError, PasswordResetService,
    PasswordResetTokenGenerator, RegistrationError, RegistrationRequest, SessionError,
    SessionManager,
};
pub use board::{Board, BoardService, Post, Topic};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository, UserUpdate};
pub use error::{BoardsError, Result};
