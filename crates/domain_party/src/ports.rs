//! Customer Directory Port
//!
//! The billing engine sees customers only through [`CustomerDirectory`].
//! The PostgreSQL adapter lives in `infra_db`; the in-memory adapter below
//! backs unit tests and local runs.
//!
//! ```rust,ignore
//! use domain_party::ports::CustomerDirectory;
//! use std::sync::Arc;
//!
//! let directory: Arc<dyn CustomerDirectory> = Arc::new(PostgresCustomerDirectory::new(pool));
//! let active = directory.list_active().await?;
//! ```

use async_trait::async_trait;

use core_kernel::{CustomerId, DomainPort, HealthCheckable, PortError};

use crate::customer::{Customer, NewCustomer};

/// Read access to customers, plus registration for directory owners
#[async_trait]
pub trait CustomerDirectory: DomainPort + HealthCheckable {
    /// Retrieves a customer by ID
    ///
    /// # Returns
    ///
    /// The customer if found, or `PortError::NotFound`
    async fn get_customer(&self, id: &CustomerId) -> Result<Customer, PortError>;

    /// Lists every customer whose status is active
    async fn list_active(&self) -> Result<Vec<Customer>, PortError>;

    /// Registers a customer
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the id or email is already taken,
    /// `PortError::Validation` if the request is malformed.
    async fn register(&self, request: NewCustomer) -> Result<Customer, PortError>;
}

/// In-memory customer directory
///
/// Stores customers in a map guarded by an async lock.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use chrono::Utc;

    use core_kernel::HealthCheckResult;

    use crate::customer::CustomerStatus;
    use crate::error::PartyError;

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryCustomerDirectory {
        customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
        fail_listing: Arc<AtomicBool>,
    }

    impl InMemoryCustomerDirectory {
        /// Creates an empty directory
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with customers for testing
        pub async fn with_customers(customers: Vec<Customer>) -> Self {
            let directory = Self::new();
            {
                let mut map = directory.customers.write().await;
                for customer in customers {
                    map.insert(customer.id.clone(), customer);
                }
            }
            directory
        }

        /// Changes a customer's status
        pub async fn set_status(&self, id: &CustomerId, status: CustomerStatus) -> Result<(), PortError> {
            let mut map = self.customers.write().await;
            let customer = map
                .get_mut(id)
                .ok_or_else(|| PortError::not_found("Customer", id))?;
            customer.status = status;
            customer.updated_at = Utc::now();
            Ok(())
        }

        /// Makes `list_active` fail with a connection error
        pub fn fail_listing(&self, fail: bool) {
            self.fail_listing.store(fail, Ordering::SeqCst);
        }

        /// Removes a customer, simulating a directory that no longer knows it
        pub async fn remove(&self, id: &CustomerId) {
            self.customers.write().await.remove(id);
        }
    }

    impl DomainPort for InMemoryCustomerDirectory {}

    #[async_trait]
    impl HealthCheckable for InMemoryCustomerDirectory {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("in-memory-customer-directory")
        }
    }

    #[async_trait]
    impl CustomerDirectory for InMemoryCustomerDirectory {
        async fn get_customer(&self, id: &CustomerId) -> Result<Customer, PortError> {
            self.customers
                .read()
                .await
                .get(id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Customer", id))
        }

        async fn list_active(&self) -> Result<Vec<Customer>, PortError> {
            if self.fail_listing.load(Ordering::SeqCst) {
                return Err(PortError::connection("customer directory unavailable"));
            }
            let map = self.customers.read().await;
            let mut active: Vec<Customer> = map.values().filter(|c| c.is_active()).cloned().collect();
            active.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(active)
        }

        async fn register(&self, request: NewCustomer) -> Result<Customer, PortError> {
            let customer = request.into_customer(Utc::now())?;
            let mut map = self.customers.write().await;

            if map.contains_key(&customer.id) {
                return Err(PartyError::DuplicateCustomer(format!(
                    "customer {} already exists",
                    customer.id
                ))
                .into());
            }
            if map.values().any(|c| c.email == customer.email) {
                return Err(PartyError::DuplicateCustomer(format!(
                    "email {} is already registered",
                    customer.email
                ))
                .into());
            }

            map.insert(customer.id.clone(), customer.clone());
            Ok(customer)
        }
    }
}
