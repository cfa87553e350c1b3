// --- File: crates/paybridge_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities


// Re-export error types and utilities for easier access
pub use error::{
    not_found, require_field, validation_error, BridgeError,
    HttpStatusCode, UNKNOWN_ERROR_MESSAGE,
};

// Re-export HTTP utilities for easier access
pub use http::{
    client::HTTP_CLIENT,
    IntoHttpResponse, JsonBody,
};

// Re-export logging utilities for easier access
pub use logging::{init_with_level, parse_level};
