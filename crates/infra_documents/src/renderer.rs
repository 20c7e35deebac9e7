//! [`InvoiceRenderer`] backed by the PDF painter

use async_trait::async_trait;
use tracing::info;

use core_kernel::PortError;
use domain_billing::{Bill, InvoiceArtifact, InvoiceRenderer, Payment};
use domain_party::Customer;

use crate::error::DocumentError;
use crate::layout::{Branding, InvoiceLayout};
use crate::pdf::PdfPainter;
use crate::store::ArtifactStore;

#[derive(Debug, Clone)]
pub struct PdfInvoiceRenderer {
    painter: PdfPainter,
    branding: Branding,
    store: Option<ArtifactStore>,
}

impl PdfInvoiceRenderer {
    pub fn new(painter: PdfPainter, branding: Branding) -> Self {
        Self {
            painter,
            branding,
            store: None,
        }
    }

    /// Persists every rendered artifact in `store`
    pub fn with_store(mut self, store: ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }
}

#[async_trait]
impl InvoiceRenderer for PdfInvoiceRenderer {
    async fn render(
        &self,
        customer: &Customer,
        bill: &Bill,
        payment: &Payment,
    ) -> Result<InvoiceArtifact, PortError> {
        let layout = InvoiceLayout::build(customer, bill, payment, &self.branding);
        let painter = self.painter.clone();

        let bytes = tokio::task::spawn_blocking(move || painter.paint(&layout))
            .await
            .map_err(|e| DocumentError::Task(e.to_string()))??;

        let path = match &self.store {
            Some(store) => Some(store.write(&bill.bill_id, &bytes).await?),
            None => None,
        };

        info!(bill_id = %bill.bill_id, size = bytes.len(), "Invoice rendered");
        Ok(InvoiceArtifact {
            file_name: ArtifactStore::file_name(&bill.bill_id),
            path,
            bytes,
        })
    }
}
