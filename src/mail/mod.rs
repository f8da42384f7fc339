//! Outbound email for Boards.
//!
//! This module provides:
//! - The `EmailMessage` type
//! - The `Mailer` trait and its memory, console and file backends
//! - Backend selection from configuration

mod backend;
mod types;

pub use backend::{from_config, ConsoleMailer, FileMailer, Mailer, MemoryMailer};
pub use types::{EmailMessage, MailError};
