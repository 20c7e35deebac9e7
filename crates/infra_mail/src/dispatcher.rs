//! [`InvoiceDispatcher`] that mails the invoice

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;
use tracing::info;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable, PortError};
use domain_billing::{Bill, InvoiceArtifact, InvoiceDispatcher};
use domain_party::Customer;

use crate::mailer::Mailer;
use crate::message::{Attachment, Email};
use crate::template::{render_html, subject, InvoiceMail, MailBranding};

/// Sender and fixed recipients
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    pub sender_name: String,
    pub sender_address: String,
    /// Copied on every invoice mail
    pub ops_mailbox: String,
}

impl DispatchSettings {
    fn from_header(&self) -> String {
        format!("{} <{}>", self.sender_name, self.sender_address)
    }
}

pub struct EmailInvoiceDispatcher {
    mailer: Arc<dyn Mailer>,
    settings: DispatchSettings,
    branding: MailBranding,
}

impl EmailInvoiceDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, settings: DispatchSettings, branding: MailBranding) -> Self {
        Self {
            mailer,
            settings,
            branding,
        }
    }

    /// Composes the confirmation email for a settled bill
    pub fn compose(&self, customer: &Customer, bill: &Bill, artifact: &InvoiceArtifact) -> Email {
        let bill_id = bill.bill_id.as_str();
        let period = bill.period.label();
        let html = render_html(
            &self.branding,
            &InvoiceMail {
                customer_name: &customer.name,
                bill_id,
                period: &period,
                amount: bill.amount,
                year: bill.generated_date.year(),
            },
        );

        let mut email = Email::new(
            self.settings.from_header(),
            customer.email.clone(),
            subject(&self.branding, bill_id, &period),
        )
        .html(html)
        .attach(Attachment::pdf(artifact.file_name.clone(), artifact.bytes.clone()));

        let ops = &self.settings.ops_mailbox;
        if !ops.eq_ignore_ascii_case(&customer.email) {
            email = email.to(ops.clone());
        }
        email
    }
}

#[async_trait]
impl InvoiceDispatcher for EmailInvoiceDispatcher {
    async fn dispatch(
        &self,
        customer: &Customer,
        bill: &Bill,
        artifact: &InvoiceArtifact,
    ) -> Result<(), PortError> {
        let email = self.compose(customer, bill, artifact);
        self.mailer.send(&email).await?;
        info!(bill_id = %bill.bill_id, to = ?email.to, "Invoice email sent");
        Ok(())
    }
}

#[async_trait]
impl HealthCheckable for EmailInvoiceDispatcher {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let healthy = self.mailer.is_healthy().await;
        let mut result = HealthCheckResult::healthy("invoice-mailer");
        result.latency_ms = start.elapsed().as_millis() as u64;
        if !healthy {
            result.status = AdapterHealth::Unhealthy;
            result.message = Some("mail transport unavailable".to_string());
        }
        result
    }
}
