// --- File: crates/paybridge_stripe/src/routes.rs ---

use crate::handlers::{
    cards_handler, charge_handler, config_handler, create_customer_handler,
    create_invoice_handler, create_payment_intent_handler, create_setup_intent_handler,
    webhook_handler, StripeState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all payment routes.
pub fn routes(state: Arc<StripeState>) -> Router {
    Router::new()
        .route("/config", get(config_handler))
        .route("/create-setup-intent", get(create_setup_intent_handler))
        .route("/create-payment-intent", post(create_payment_intent_handler))
        .route("/webhook", post(webhook_handler))
        .route("/customer", post(create_customer_handler))
        .route("/create-invoice", post(create_invoice_handler))
        .route("/charge", post(charge_handler))
        .route("/cards", post(cards_handler))
        .with_state(state)
}
