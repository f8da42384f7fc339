//! Outbound email types.

use thiserror::Error;

/// An email ready to hand to a [`Mailer`](super::Mailer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
}

impl EmailMessage {
    /// Create a message for a single recipient.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            from: from.into(),
            to: vec![to.into()],
        }
    }

    /// Render the message in RFC 5322 style (headers, blank line, body).
    pub fn to_rfc5322(&self) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
            self.from,
            self.to.join(", "),
            self.subject,
            self.body.replace('\n', "\r\n")
        )
    }
}

/// Mail delivery errors.
#[derive(Error, Debug)]
pub enum MailError {
    /// The message has no recipient.
    #[error("message has no recipients")]
    NoRecipients,

    /// A header contains a line break.
    #[error("header injection attempt in {0}")]
    HeaderInjection(&'static str),

    /// Writing the message failed.
    #[error("failed to deliver message: {0}")]
    Delivery(String),

    /// Unknown backend name in configuration.
    #[error("unknown mail backend: {0}")]
    UnknownBackend(String),
}

impl EmailMessage {
    /// Reject messages that cannot be delivered safely.
    pub fn validate(&self) -> Result<(), MailError> {
        if self.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        let has_newline = |s: &str| s.contains('\r') || s.contains('\n');
        if has_newline(&self.subject) {
            return Err(MailError::HeaderInjection("subject"));
        }
        if has_newline(&self.from) {
            return Err(MailError::HeaderInjection("from"));
        }
        if self.to.iter().any(|t| has_newline(t)) {
            return Err(MailError::HeaderInjection("to"));
        }
        Ok(())
    }
}
