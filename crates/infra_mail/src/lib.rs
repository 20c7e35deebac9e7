//! Invoice Mail
//!
//! Sends the invoice confirmation for a settled bill. [`Mailer`] is the
//! transport seam: [`SmtpMailer`] talks to a relay through lettre,
//! [`RecordingMailer`] keeps messages in memory and [`LogMailer`] only logs.

pub mod dispatcher;
pub mod error;
pub mod mailer;
pub mod message;
pub mod smtp;
pub mod template;

pub use dispatcher::{DispatchSettings, EmailInvoiceDispatcher};
pub use error::MailError;
pub use mailer::{LogMailer, Mailer, RecordingMailer};
pub use message::{Attachment, Email};
pub use smtp::{SmtpConfig, SmtpMailer};
pub use template::MailBranding;
