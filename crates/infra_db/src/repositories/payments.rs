//! PostgreSQL payment ledger
//!
//! Payments are insert-only; `payments_bill_key` keeps one payment per bill.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{
    BillId, Currency, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, Money, PaymentId,
    PortError,
};
use domain_billing::{Payment, PaymentLedger, PaymentMode};

use crate::error::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: String,
    pub bill_id: String,
    pub customer_id: String,
    pub amount_paid: Decimal,
    pub currency: String,
    pub payment_date: DateTime<Utc>,
    pub mode: String,
}

fn corrupt(e: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::SerializationError(e.to_string())
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let currency: Currency = row.currency.trim().parse().map_err(corrupt)?;
        Ok(Payment {
            payment_id: PaymentId::parse(row.payment_id).map_err(corrupt)?,
            bill_id: BillId::parse(row.bill_id).map_err(corrupt)?,
            customer_id: CustomerId::parse(row.customer_id).map_err(corrupt)?,
            amount_paid: Money::new(row.amount_paid.normalize(), currency),
            payment_date: row.payment_date,
            mode: row.mode.parse::<PaymentMode>().map_err(corrupt)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresPaymentLedger {}

#[async_trait]
impl HealthCheckable for PostgresPaymentLedger {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-payment-ledger").await
    }
}

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    #[instrument(skip(self, payment), fields(payment_id = %payment.payment_id, bill_id = %payment.bill_id))]
    async fn insert(&self, payment: &Payment) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO payments (payment_id, bill_id, customer_id, amount_paid, currency, payment_date, mode) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(payment.payment_id.as_str())
        .bind(payment.bill_id.as_str())
        .bind(payment.customer_id.as_str())
        .bind(payment.amount_paid.amount())
        .bind(payment.amount_paid.currency().code())
        .bind(payment.payment_date)
        .bind(payment.mode.as_str())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn find_by_bill(&self, bill_id: &BillId) -> Result<Option<Payment>, PortError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT payment_id, bill_id, customer_id, amount_paid, currency, payment_date, mode \
             FROM payments WHERE bill_id = $1",
        )
        .bind(bill_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.map(Payment::try_from).transpose()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_row_maps_to_payment() {
        let row = PaymentRow {
            payment_id: "PAY-1".to_string(),
            bill_id: "BILL-1".to_string(),
            customer_id: "C1".to_string(),
            amount_paid: dec!(2500.0000),
            currency: "INR".to_string(),
            payment_date: Utc::now(),
            mode: "UPI".to_string(),
        };
        let payment = Payment::try_from(row).unwrap();
        assert_eq!(payment.mode, PaymentMode::Upi);
        assert_eq!(payment.amount_paid.amount(), dec!(2500));
        assert_eq!(payment.amount_paid.to_string(), "₹2500");
    }
}
