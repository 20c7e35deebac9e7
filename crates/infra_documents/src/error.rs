//! Document errors

use thiserror::Error;

use core_kernel::PortError;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// The PDF backend rejected the document
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    /// Writing the artifact failed
    #[error("Failed to store invoice artifact: {0}")]
    Io(#[from] std::io::Error),

    /// The rendering task panicked or was cancelled
    #[error("Rendering task failed: {0}")]
    Task(String),
}

impl From<DocumentError> for PortError {
    fn from(err: DocumentError) -> Self {
        PortError::internal_from("Error generating invoice", err)
    }
}
