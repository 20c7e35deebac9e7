//! PostgreSQL bill ledger
//!
//! Status changes are single conditional `UPDATE`s on `(bill_id, status)`,
//! so two writers racing on one bill cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    BillId, BillingPeriod, Currency, CustomerId, DomainPort, HealthCheckResult, HealthCheckable,
    Money, PortError,
};
use domain_billing::{Bill, BillLedger, BillStatus};

use crate::error::DatabaseError;

const BILL_COLUMNS: &str =
    "bill_id, customer_id, period, amount, currency, status, generated_date, due_date, paid_date";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillRow {
    pub bill_id: String,
    pub customer_id: String,
    pub period: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub generated_date: NaiveDate,
    pub due_date: NaiveDate,
    pub paid_date: Option<DateTime<Utc>>,
}

fn corrupt(e: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::SerializationError(e.to_string())
}

impl TryFrom<BillRow> for Bill {
    type Error = DatabaseError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let currency: Currency = row.currency.trim().parse().map_err(corrupt)?;
        Ok(Bill {
            bill_id: BillId::parse(row.bill_id).map_err(corrupt)?,
            customer_id: CustomerId::parse(row.customer_id).map_err(corrupt)?,
            period: row.period.parse::<BillingPeriod>().map_err(corrupt)?,
            // NUMERIC(19,4) reads back with scale 4
            amount: Money::new(row.amount.normalize(), currency),
            status: row.status.parse::<BillStatus>().map_err(corrupt)?,
            generated_date: row.generated_date,
            due_date: row.due_date,
            paid_date: row.paid_date,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PostgresBillLedger {
    pool: PgPool,
}

impl PostgresBillLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresBillLedger {}

#[async_trait]
impl HealthCheckable for PostgresBillLedger {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-bill-ledger").await
    }
}

#[async_trait]
impl BillLedger for PostgresBillLedger {
    #[instrument(skip(self, bill), fields(bill_id = %bill.bill_id))]
    async fn insert(&self, bill: &Bill) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO bills (bill_id, customer_id, period, amount, currency, status, \
             generated_date, due_date, paid_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(bill.bill_id.as_str())
        .bind(bill.customer_id.as_str())
        .bind(bill.period.label())
        .bind(bill.amount.amount())
        .bind(bill.amount.currency().code())
        .bind(bill.status.as_str())
        .bind(bill.generated_date)
        .bind(bill.due_date)
        .bind(bill.paid_date)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn get(&self, id: &BillId) -> Result<Bill, PortError> {
        let row = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {} FROM bills WHERE bill_id = $1",
            BILL_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PortError::not_found("Bill", id))?;

        Ok(Bill::try_from(row)?)
    }

    async fn find_for_period(
        &self,
        customer_id: &CustomerId,
        period: BillingPeriod,
    ) -> Result<Option<Bill>, PortError> {
        let row = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {} FROM bills WHERE customer_id = $1 AND period = $2",
            BILL_COLUMNS
        ))
        .bind(customer_id.as_str())
        .bind(period.label())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.map(Bill::try_from).transpose()?)
    }

    #[instrument(skip(self, paid_date))]
    async fn transition(
        &self,
        id: &BillId,
        expected: BillStatus,
        next: BillStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> Result<Bill, PortError> {
        if !expected.can_transition_to(next) {
            return Err(PortError::conflict(format!(
                "bill {} cannot move from {} to {}",
                id, expected, next
            )));
        }
        let paid_date = if next == BillStatus::Paid { paid_date } else { None };

        let updated = sqlx::query_as::<_, BillRow>(&format!(
            "UPDATE bills SET status = $3, paid_date = $4, updated_at = now() \
             WHERE bill_id = $1 AND status = $2 RETURNING {}",
            BILL_COLUMNS
        ))
        .bind(id.as_str())
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(paid_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if let Some(row) = updated {
            debug!(bill_id = %id, from = %expected, to = %next, "Bill status changed");
            return Ok(Bill::try_from(row)?);
        }

        // Nothing matched: either the bill is missing or its status moved on
        let current = sqlx::query_scalar::<_, String>("SELECT status FROM bills WHERE bill_id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        match current {
            None => Err(PortError::not_found("Bill", id)),
            Some(status) => Err(PortError::conflict(format!(
                "bill {} is {}, expected {}",
                id, status, expected
            ))),
        }
    }

    async fn list_pending_due_before(&self, date: NaiveDate) -> Result<Vec<Bill>, PortError> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {} FROM bills WHERE status = 'pending' AND due_date < $1 ORDER BY bill_id",
            BILL_COLUMNS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| Bill::try_from(row).map_err(PortError::from))
            .collect()
    }
}
