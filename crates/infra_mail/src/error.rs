//! Mail errors

use thiserror::Error;

use core_kernel::PortError;

#[derive(Debug, Error)]
pub enum MailError {
    /// Missing sender, recipients, subject or body
    #[error("Invalid email: {0}")]
    InvalidMessage(String),

    /// An address could not be parsed
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The transport could not be built
    #[error("Mail transport misconfigured: {0}")]
    Configuration(String),

    /// The server refused or the connection failed
    #[error("Failed to send email: {0}")]
    Transport(String),
}

impl From<MailError> for PortError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Transport(_) => PortError::connection(err.to_string()),
            other => PortError::internal_from("Error sending invoice email", other),
        }
    }
}
