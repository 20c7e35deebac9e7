//! Invoice Documents
//!
//! Builds the invoice for a settled bill in two steps: a pure
//! [`InvoiceLayout`] decides what is printed, and [`PdfPainter`] decides
//! where. [`PdfInvoiceRenderer`] ties both to the billing renderer port and
//! optionally keeps a copy on disk through [`ArtifactStore`].

pub mod error;
pub mod format;
pub mod layout;
pub mod pdf;
pub mod renderer;
pub mod store;

pub use error::DocumentError;
pub use layout::{Branding, InvoiceLayout};
pub use pdf::PdfPainter;
pub use renderer::PdfInvoiceRenderer;
pub use store::ArtifactStore;
