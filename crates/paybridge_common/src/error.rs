use std::fmt;
use thiserror::Error;

/// Message returned to callers for failures whose details stay in the log.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown server error";

/// The base error type for all PayBridge errors.
///
/// Each crate keeps its own error enum and implements `From<SpecificError>`
/// for `BridgeError`; handlers return `BridgeError` so every failure leaves
/// the service with the same body shape.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Error occurred during an outbound HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The request body was malformed or a required field is missing
    #[error("Invalid request: {0}")]
    ValidationError(String),

    /// The identifier store could not be opened
    #[error("Customer store unavailable: {0}")]
    StoreUnavailable(String),

    /// A read or write against the identifier store failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The payment gateway rejected the request with a structured error.
    /// The message is passed to the caller unchanged.
    #[error("{0}")]
    GatewayError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BridgeError {
    fn status_code(&self) -> u16 {
        match self {
            BridgeError::HttpError(_) => 500,
            BridgeError::ParseError(_) => 500,
            BridgeError::ConfigError(_) => 500,
            BridgeError::ValidationError(_) => 400,
            BridgeError::StoreUnavailable(_) => 503,
            BridgeError::DatabaseError(_) => 500,
            BridgeError::GatewayError(_) => 400,
            BridgeError::NotFoundError(_) => 404,
            BridgeError::InternalError(_) => 500,
        }
    }
}

impl BridgeError {
    /// The message placed in the response body.
    ///
    /// Gateway, validation, lookup and availability errors are shown as is;
    /// everything else collapses to [`UNKNOWN_ERROR_MESSAGE`].
    pub fn public_message(&self) -> String {
        match self {
            BridgeError::GatewayError(message) => message.clone(),
            BridgeError::ValidationError(_)
            | BridgeError::NotFoundError(_)
            | BridgeError::StoreUnavailable(_) => self.to_string(),
            _ => UNKNOWN_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::ParseError(err.to_string())
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> BridgeError {
    BridgeError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> BridgeError {
    BridgeError::NotFoundError(message.to_string())
}

/// Rejects an empty (or whitespace-only) required field.
pub fn require_field(name: &str, value: &str) -> Result<(), BridgeError> {
    if value.trim().is_empty() {
        return Err(validation_error(format!("missing required field `{name}`")));
    }
    Ok(())
}
