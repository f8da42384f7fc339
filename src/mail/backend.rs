//! Mail delivery backends.
//!
//! - `memory`: keeps sent messages in an outbox (tests and development)
//! - `console`: logs each message through `tracing`
//! - `file`: writes each message as a `.eml` file into a directory

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::types::{EmailMessage, MailError};
use crate::config::MailConfig;

/// Something that can deliver email.
///
/// Delivery is synchronous; none of the backends block for long.
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Collects messages in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message sent so far.
    pub fn outbox(&self) -> Vec<EmailMessage> {
        match self.outbox.lock() {
            Ok(outbox) => outbox.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Forget all sent messages.
    pub fn clear(&self) {
        match self.outbox.lock() {
            Ok(mut outbox) => outbox.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        message.validate()?;
        let mut outbox = self
            .outbox
            .lock()
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        outbox.push(message.clone());
        debug!(to = ?message.to, subject = %message.subject, "Mail stored in outbox");
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        message.validate()?;
        info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            "Outgoing mail:\n{}",
            message.body
        );
        Ok(())
    }
}

/// Writes each message to its own file.
#[derive(Debug, Clone)]
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    /// Create a file mailer writing into `dir` (created on first send).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Mailer for FileMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        message.validate()?;
        std::fs::create_dir_all(&self.dir).map_err(|e| MailError::Delivery(e.to_string()))?;

        let name = format!(
            "{}-{}.eml",
            chrono::Utc::now().format("%Y%m%d-%H%M%S"),
            uuid::Uuid::new_v4().simple()
        );
        let path = self.dir.join(name);
        std::fs::write(&path, message.to_rfc5322())
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        info!(path = %path.display(), to = ?message.to, "Mail written to file");
        Ok(())
    }
}

/// Build the mailer selected by configuration.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryMailer::new())),
        "console" => Ok(Arc::new(ConsoleMailer)),
        "file" => Ok(Arc::new(FileMailer::new(&config.file_path))),
        other => Err(MailError::UnknownBackend(other.to_string())),
    }
}
