// --- File: crates/paybridge_stripe/src/provisioning.rs ---
//! Get-or-create of the gateway customer behind an application user.
//!
//! The check, the gateway call and the store write run under a lock keyed by
//! user id, so concurrent first requests for one user create one customer.
//! The final write is a compare-and-insert, which keeps the first mapping even
//! if another process raced us.

use paybridge_common::BridgeError;
use paybridge_store::CustomerMapRepository;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::models::CreateCustomer;
use crate::service::PaymentGateway;

/// Per-user advisory locks.
#[derive(Debug, Default)]
pub struct ProvisioningLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ProvisioningLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the lock of `user_id`. It is released when the guard drops.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only the map still references are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of users with a held or awaited lock.
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

/// Returns the customer mapped to `user_id`, creating and storing one if
/// the user has none yet.
pub async fn ensure_customer<R>(
    locks: &ProvisioningLocks,
    customers: &R,
    gateway: &dyn PaymentGateway,
    user_id: &str,
    params: &CreateCustomer,
) -> Result<String, BridgeError>
where
    R: CustomerMapRepository + Sync,
{
    if let Some(customer_id) = customers.get_customer(user_id).await? {
        return Ok(customer_id);
    }

    let _guard = locks.acquire(user_id).await;

    if let Some(customer_id) = customers.get_customer(user_id).await? {
        debug!(
            "User {} was provisioned while waiting: {}",
            user_id, customer_id
        );
        return Ok(customer_id);
    }

    info!("No customer for user {}, creating one", user_id);
    let customer = gateway.create_customer(params).await?;
    let stored = customers
        .add_customer_if_absent(user_id, &customer.id)
        .await?;

    if stored != customer.id {
        warn!(
            "User {} was mapped to {} by another writer; customer {} is unused",
            user_id, stored, customer.id
        );
    }
    Ok(stored)
}
