//! PostgreSQL customer directory

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{CustomerId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_party::{Customer, CustomerDirectory, NewCustomer};

use crate::error::DatabaseError;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, status, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DatabaseError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: CustomerId::parse(row.id).map_err(|e| DatabaseError::SerializationError(e.to_string()))?,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            status: row
                .status
                .parse()
                .map_err(|e: domain_party::PartyError| DatabaseError::SerializationError(e.to_string()))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCustomerDirectory {
    pool: PgPool,
}

impl PostgresCustomerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresCustomerDirectory {}

#[async_trait]
impl HealthCheckable for PostgresCustomerDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-customer-directory").await
    }
}

#[async_trait]
impl CustomerDirectory for PostgresCustomerDirectory {
    #[instrument(skip(self))]
    async fn get_customer(&self, id: &CustomerId) -> Result<Customer, PortError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PortError::not_found("Customer", id))?;

        Ok(Customer::try_from(row)?)
    }

    async fn list_active(&self) -> Result<Vec<Customer>, PortError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE status = 'active' ORDER BY id",
            CUSTOMER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        debug!(count = rows.len(), "Loaded active customers");
        rows.into_iter()
            .map(|row| Customer::try_from(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn register(&self, request: NewCustomer) -> Result<Customer, PortError> {
        let customer = request.into_customer(Utc::now())?;

        sqlx::query(
            "INSERT INTO customers (id, name, email, phone, address, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(customer.id.as_str())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.status.as_str())
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_party::CustomerStatus;

    fn row(status: &str) -> CustomerRow {
        let now = Utc::now();
        CustomerRow {
            id: "C1".to_string(),
            name: "Asha Rao".to_string(),
            email: "a@x.com".to_string(),
            phone: "+91 98765 43210".to_string(),
            address: "Bhubaneswar".to_string(),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_maps_to_customer() {
        let customer = Customer::try_from(row("inactive")).unwrap();
        assert_eq!(customer.id.as_str(), "C1");
        assert_eq!(customer.status, CustomerStatus::Inactive);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(matches!(
            Customer::try_from(row("suspended")),
            Err(DatabaseError::SerializationError(_))
        ));
    }
}
