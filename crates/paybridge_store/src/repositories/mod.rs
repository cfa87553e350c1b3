//! Repository modules for store access
//!
//! Each repository gives one bucket of the store a typed interface.

pub mod customer_map;
pub mod customer_map_sql;

pub use customer_map::{CustomerMapRepository, CUSTOMERS_BUCKET};
pub use customer_map_sql::SqlCustomerMapRepository;
