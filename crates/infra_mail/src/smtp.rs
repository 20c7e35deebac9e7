//! SMTP mailer using lettre

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::MailError;
use crate::mailer::Mailer;
use crate::message::Email;

/// SMTP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    /// 587 for STARTTLS
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 587,
            username: None,
            password: None,
            starttls: true,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Use a plain connection or implicit TLS instead of STARTTLS
    pub fn no_starttls(mut self) -> Self {
        self.starttls = false;
        self
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Builds the MIME message: an HTML part plus one part per attachment
pub fn build_message(email: &Email) -> Result<Message, MailError> {
    email.validate()?;

    let mut builder = Message::builder()
        .from(parse_mailbox(&email.from)?)
        .subject(email.subject.clone());

    for to in email.to.iter().filter(|r| !r.trim().is_empty()) {
        builder = builder.to(parse_mailbox(to)?);
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(email.html.clone()));
    for attachment in &email.attachments {
        let content_type = ContentType::parse(&attachment.content_type)
            .map_err(|e| MailError::InvalidMessage(format!("bad content type: {}", e)))?;
        body = body.singlepart(
            MimeAttachment::new(attachment.file_name.clone()).body(attachment.bytes.clone(), content_type),
        );
    }

    builder
        .multipart(body)
        .map_err(|e| MailError::InvalidMessage(format!("Failed to build email: {}", e)))
}

/// SMTP mailer using lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Configuration(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Configuration(e.to_string()))?
        };

        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        debug!(host = %self.config.host, to = ?email.to, "Email sent");
        Ok(())
    }

    /// Opens a connection and issues `NOOP`
    async fn is_healthy(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(host = %self.config.host, error = %e, "SMTP health check failed");
                false
            }
        }
    }
}

// AsyncSmtpTransport does not implement Debug
impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Attachment;

    #[test]
    fn test_build_message_with_attachment() {
        let email = Email::new("OdishaTech Billing Team <billing@otss.com>", "a@x.com", "Invoice")
            .to("ops@otss.com")
            .html("<p>Thanks</p>")
            .attach(Attachment::pdf("B1.pdf", b"%PDF-1.3".to_vec()));

        let message = build_message(&email).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(raw.contains("Subject: Invoice"));
        assert!(raw.contains("ops@otss.com"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("B1.pdf"));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let email = Email::new("billing@otss.com", "not an address", "Invoice").html("<p>x</p>");
        assert!(matches!(build_message(&email), Err(MailError::InvalidAddress { .. })));
    }
}
