//! SQL implementation of the customer mapping repository

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::repositories::customer_map::{CustomerMapRepository, CUSTOMERS_BUCKET};
use tracing::debug;

/// Customer mapping backed by the embedded SQLite store.
#[derive(Debug, Clone)]
pub struct SqlCustomerMapRepository {
    client: StoreClient,
}

impl SqlCustomerMapRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &StoreClient {
        &self.client
    }
}

impl CustomerMapRepository for SqlCustomerMapRepository {
    async fn get_customer(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let customer = self.client.get(CUSTOMERS_BUCKET, user_id).await?;
        debug!(
            "Customer lookup for user {}: {}",
            user_id,
            customer.as_deref().unwrap_or("<none>")
        );
        Ok(customer)
    }

    async fn add_customer(&self, user_id: &str, customer_id: &str) -> Result<(), StoreError> {
        self.client.put(CUSTOMERS_BUCKET, user_id, customer_id).await?;
        debug!("Mapped user {} to customer {}", user_id, customer_id);
        Ok(())
    }

    async fn add_customer_if_absent(
        &self,
        user_id: &str,
        customer_id: &str,
    ) -> Result<String, StoreError> {
        let stored = self
            .client
            .put_if_absent(CUSTOMERS_BUCKET, user_id, customer_id)
            .await?;
        if stored != customer_id {
            debug!(
                "User {} already mapped to customer {}, kept it over {}",
                user_id, stored, customer_id
            );
        }
        Ok(stored)
    }
}
