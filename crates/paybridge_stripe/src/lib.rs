// --- File: crates/paybridge_stripe/src/lib.rs ---

pub mod client;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod models;
pub mod provisioning;
pub mod routes;
pub mod service;
pub mod webhook;

#[cfg(test)]
mod handlers_test;

// Re-export for main backend
pub use client::StripeClient;
pub use error::StripeError;
pub use handlers::StripeState;
pub use routes::routes;
pub use service::PaymentGateway;
