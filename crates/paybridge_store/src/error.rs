//! Error types for the identifier store

use paybridge_common::BridgeError;
use thiserror::Error;

/// Errors that can occur when working with the identifier store.
///
/// A missing mapping is not an error; lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be opened within the configured wait
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A lookup failed at the storage layer
    #[error("Store read failed: {0}")]
    Read(#[source] sqlx::Error),

    /// An insert failed at the storage layer
    #[error("Store write failed: {0}")]
    Write(#[source] sqlx::Error),

    /// Error with the store configuration
    #[error("Store configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for BridgeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => BridgeError::StoreUnavailable(msg),
            StoreError::Read(e) => BridgeError::DatabaseError(format!("read failed: {}", e)),
            StoreError::Write(e) => BridgeError::DatabaseError(format!("write failed: {}", e)),
            StoreError::Config(msg) => BridgeError::ConfigError(msg),
        }
    }
}
