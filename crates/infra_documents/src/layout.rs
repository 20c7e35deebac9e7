//! Invoice layout model
//!
//! [`InvoiceLayout::build`] is a pure function of its inputs; the painter
//! only positions what the layout already decided to print.

use serde::{Deserialize, Serialize};

use core_kernel::Money;
use domain_billing::{Bill, Payment};
use domain_party::Customer;

use crate::format::format_date;

/// Seller identity and boilerplate printed on every invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    pub seller_name: String,
    pub seller_office: String,
    pub billing_contact: String,
    pub copyright_year: i32,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            seller_name: "OdishaTech Software Solutions Pvt. Ltd".to_string(),
            seller_office: "Corporate Office, Bhubaneswar".to_string(),
            billing_contact: "billing@company.com".to_string(),
            copyright_year: 2025,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPanel {
    pub status_marker: String,
    pub payment_reference: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub due_date: String,
    pub total_payable: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyBlock {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressColumn {
    pub heading: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderInfo {
    pub order_date: String,
    pub order_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Everything printed on one invoice, in reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLayout {
    pub title: String,
    pub summary: SummaryPanel,
    pub party: PartyBlock,
    pub addresses: Vec<AddressColumn>,
    pub order: OrderInfo,
    pub line_items: Vec<LineItem>,
    pub total: Money,
    pub footer: Vec<String>,
}

impl InvoiceLayout {
    pub fn build(customer: &Customer, bill: &Bill, payment: &Payment, branding: &Branding) -> Self {
        let invoice_date = format_date(bill.generated_date);

        let customer_lines = vec![customer.name.clone(), customer.address.clone()];

        Self {
            title: "Invoice".to_string(),
            summary: SummaryPanel {
                status_marker: "Paid".to_string(),
                payment_reference: payment.payment_id.to_string(),
                invoice_number: bill.bill_id.to_string(),
                invoice_date: invoice_date.clone(),
                due_date: format_date(bill.due_date),
                total_payable: bill.amount,
            },
            party: PartyBlock {
                name: customer.name.clone(),
                address: customer.address.clone(),
                email: customer.email.clone(),
                phone: customer.phone.clone(),
            },
            addresses: vec![
                AddressColumn {
                    heading: "Billing address".to_string(),
                    lines: customer_lines.clone(),
                },
                AddressColumn {
                    heading: "Delivery address".to_string(),
                    lines: customer_lines,
                },
                AddressColumn {
                    heading: "Sold by".to_string(),
                    lines: vec![branding.seller_name.clone(), branding.seller_office.clone()],
                },
            ],
            order: OrderInfo {
                order_date: invoice_date,
                order_number: format!("ORD-{}", bill.bill_id),
            },
            line_items: vec![LineItem {
                description: "Monthly Rent".to_string(),
                quantity: 1,
                unit_price: bill.amount,
                subtotal: bill.amount,
            }],
            total: bill.amount,
            footer: vec![
                "This is a computer-generated invoice and does not require a signature.".to_string(),
                format!("For queries, contact {}", branding.billing_contact),
                format!(
                    "© {} {} | All Rights Reserved",
                    branding.copyright_year, branding.seller_name
                ),
            ],
        }
    }

    /// Sum of the line item subtotals
    pub fn line_total(&self) -> Money {
        self.line_items
            .iter()
            .try_fold(Money::zero(self.total.currency()), |acc, item| acc.checked_add(&item.subtotal))
            .unwrap_or(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use core_kernel::{BillingPeriod, CustomerId};
    use domain_billing::{BillingPolicy, PaymentMode};
    use domain_party::CustomerStatus;

    fn inputs() -> (Customer, Bill, Payment) {
        let now = Utc::now();
        let customer = Customer {
            id: CustomerId::parse("C1").unwrap(),
            name: "Asha Rao".to_string(),
            email: "a@x.com".to_string(),
            phone: "+91 98765 43210".to_string(),
            address: "12 MG Road, Bhubaneswar".to_string(),
            status: CustomerStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let bill = Bill::issue(
            customer.id.clone(),
            BillingPeriod::new(2025, 9).unwrap(),
            &BillingPolicy::default(),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        );
        let payment = Payment::settling(&bill, PaymentMode::Upi, now);
        (customer, bill, payment)
    }

    #[test]
    fn test_layout_is_deterministic() {
        let (customer, bill, payment) = inputs();
        let branding = Branding::default();
        assert_eq!(
            InvoiceLayout::build(&customer, &bill, &payment, &branding),
            InvoiceLayout::build(&customer, &bill, &payment, &branding)
        );
    }

    #[test]
    fn test_layout_fields() {
        let (customer, bill, payment) = inputs();
        let layout = InvoiceLayout::build(&customer, &bill, &payment, &Branding::default());

        assert_eq!(layout.summary.invoice_number, bill.bill_id.as_str());
        assert_eq!(layout.summary.payment_reference, payment.payment_id.as_str());
        assert_eq!(layout.summary.invoice_date, "01 Oct 2025");
        assert_eq!(layout.summary.due_date, "11 Oct 2025");
        assert_eq!(layout.summary.total_payable.to_string(), "₹2500");
        assert_eq!(layout.order.order_number, format!("ORD-{}", bill.bill_id));
        assert_eq!(layout.line_total(), bill.amount);
        assert_eq!(layout.total, bill.amount);
        assert_eq!(layout.addresses[0].lines, layout.addresses[1].lines);
        assert_eq!(layout.addresses[2].heading, "Sold by");
    }
}
