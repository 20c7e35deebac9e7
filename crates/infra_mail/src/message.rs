//! Outgoing email messages

use crate::error::MailError;

/// A file attached to an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn pdf(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/pdf".to_string(),
            bytes,
        }
    }
}

/// An email message to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Sender, either `addr@host` or `Display Name <addr@host>`
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

impl Email {
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            subject: subject.into(),
            html: String::new(),
            attachments: Vec::new(),
        }
    }

    /// Add a recipient
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = body.into();
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Validate the email has required fields
    pub fn validate(&self) -> Result<(), MailError> {
        if self.from.trim().is_empty() {
            return Err(MailError::InvalidMessage("'from' is required".to_string()));
        }
        if self.to.iter().all(|r| r.trim().is_empty()) {
            return Err(MailError::InvalidMessage("at least one recipient is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(MailError::InvalidMessage("'subject' is required".to_string()));
        }
        if self.html.is_empty() {
            return Err(MailError::InvalidMessage("an HTML body is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let email = Email::new("billing@x.com", "a@x.com", "Invoice").html("<p>hi</p>");
        assert!(email.validate().is_ok());

        let no_body = Email::new("billing@x.com", "a@x.com", "Invoice");
        assert!(matches!(no_body.validate(), Err(MailError::InvalidMessage(_))));

        let no_subject = Email::new("billing@x.com", "a@x.com", " ").html("<p>hi</p>");
        assert!(no_subject.validate().is_err());
    }
}
