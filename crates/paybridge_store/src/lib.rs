//! Embedded identifier store for PayBridge
//!
//! A small persistent key-value store built on SQLite through SQLx. Values
//! live in buckets addressed by `(namespace, collection)`; the service uses a
//! single bucket, `DB/CUSTOMERS`, to remember which payment gateway customer
//! belongs to which application user.
//!
//! # Example
//!
//! ```rust,no_run
//! use paybridge_config::StoreConfig;
//! use paybridge_store::{CustomerMapRepository, SqlCustomerMapRepository, StoreClient, CUSTOMERS_BUCKET};
//!
//! async fn lookup() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig {
//!         path: "data/customers.db".to_string(),
//!         open_timeout_ms: 2000,
//!         max_connections: 5,
//!     };
//!     let client = StoreClient::open(&config, &[CUSTOMERS_BUCKET]).await?;
//!     let customers = SqlCustomerMapRepository::new(client);
//!     let customer = customers.get_customer("user-1").await?;
//!     println!("{:?}", customer);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;


pub use client::{Bucket, StoreClient};
pub use error::StoreError;
pub use repositories::{CustomerMapRepository, SqlCustomerMapRepository, CUSTOMERS_BUCKET};
