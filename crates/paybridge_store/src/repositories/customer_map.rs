//! Repository for the user to customer mapping
//!
//! Maps an application user identifier to the payment gateway customer
//! identifier created for it. Once a user has a customer, that mapping is
//! never replaced by the provisioning path.

use crate::client::Bucket;
use crate::error::StoreError;

/// Bucket holding the mapping: namespace `DB`, collection `CUSTOMERS`.
pub const CUSTOMERS_BUCKET: Bucket = Bucket::new("DB", "CUSTOMERS");

/// Repository for user to customer mappings
pub trait CustomerMapRepository {
    /// Look up the customer for `user_id`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the user has no customer yet. Errors only report store
    /// failures, never absence.
    fn get_customer(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Store `customer_id` for `user_id`, replacing any previous value.
    fn add_customer(
        &self,
        user_id: &str,
        customer_id: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Store `customer_id` for `user_id` unless a mapping already exists.
    ///
    /// # Returns
    ///
    /// The customer now mapped to `user_id`: either `customer_id` or the one
    /// stored earlier.
    fn add_customer_if_absent(
        &self,
        user_id: &str,
        customer_id: &str,
    ) -> impl std::future::Future<Output = Result<String, StoreError>> + Send;
}
