//! Mailer port
//!
//! Abstracts the mail backend so the dispatcher can send through SMTP in
//! production and through [`RecordingMailer`] or [`LogMailer`] elsewhere.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::MailError;
use crate::message::Email;

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Sends an email, failing synchronously; there is no retry
    async fn send(&self, email: &Email) -> Result<(), MailError>;

    /// Check if the mailer backend is usable
    async fn is_healthy(&self) -> bool;
}

/// Logs a summary of each email instead of sending it
///
/// Bodies and attachments are never logged.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        email.validate()?;
        info!(
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Email not sent, no SMTP transport configured"
        );
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Keeps every sent email in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<RwLock<Vec<Email>>>,
    fail_with: Option<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with a transport error
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: Arc::default(),
            fail_with: Some(reason.into()),
        }
    }

    pub async fn sent(&self) -> Vec<Email> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        email.validate()?;
        if let Some(reason) = &self.fail_with {
            return Err(MailError::Transport(reason.clone()));
        }
        self.sent.write().await.push(email.clone());
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.fail_with.is_none()
    }
}
