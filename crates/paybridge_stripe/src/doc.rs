// --- File: crates/paybridge_stripe/src/doc.rs ---
#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::{
    CardSummary, CardsRequest, CardsResponse, ChargeRequest, ChargeResponse, ConfigResponse,
    CreatePaymentIntentRequest, CreatePaymentIntentResponse, CustomerRequest, CustomerResponse,
    SetupIntentResponse,
};

#[utoipa::path(
    get,
    path = "/config",
    responses(
        (status = 200, description = "Publishable key for the browser client", body = ConfigResponse)
    ),
    tag = "Payments"
)]
fn doc_config_handler() {}

#[utoipa::path(
    get,
    path = "/create-setup-intent",
    responses(
        (status = 200, description = "Setup intent created for a new anonymous customer", body = SetupIntentResponse),
        (status = 400, description = "Stripe rejected the request"),
        (status = 500, description = "Unknown server error")
    ),
    tag = "Payments"
)]
fn doc_create_setup_intent_handler() {}

#[utoipa::path(
    post,
    path = "/create-payment-intent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = CreatePaymentIntentResponse),
        (status = 400, description = "Invalid body or Stripe rejected the request"),
        (status = 503, description = "Customer store unavailable"),
        (status = 500, description = "Unknown server error")
    ),
    tag = "Payments"
)]
fn doc_create_payment_intent_handler() {}

#[utoipa::path(
    post,
    path = "/webhook",
    request_body(content = String, description = "Stripe event envelope, at most 64 KiB", content_type = "application/json"),
    responses(
        (status = 200, description = "Event received"),
        (status = 400, description = "Event could not be decoded"),
        (status = 503, description = "Body too large or unreadable")
    ),
    tag = "Stripe Webhooks"
)]
fn doc_webhook_handler() {}

#[utoipa::path(
    post,
    path = "/customer",
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Invalid body or Stripe rejected the request"),
        (status = 500, description = "Unknown server error")
    ),
    tag = "Payments"
)]
fn doc_create_customer_handler() {}

#[utoipa::path(
    post,
    path = "/create-invoice",
    responses(
        (status = 200, description = "Invoice created and finalized for the demo customer"),
        (status = 400, description = "Stripe rejected the request"),
        (status = 500, description = "Unknown server error")
    ),
    tag = "Payments"
)]
fn doc_create_invoice_handler() {}

#[utoipa::path(
    post,
    path = "/charge",
    request_body = ChargeRequest,
    responses(
        (status = 200, description = "Payment confirmed", body = ChargeResponse),
        (status = 400, description = "Invalid body or Stripe refused the charge"),
        (status = 404, description = "No customer stored for the user"),
        (status = 503, description = "Customer store unavailable"),
        (status = 500, description = "Unknown server error")
    ),
    tag = "Payments"
)]
fn doc_charge_handler() {}

#[utoipa::path(
    post,
    path = "/cards",
    request_body = CardsRequest,
    responses(
        (status = 200, description = "Saved cards of the user", body = CardsResponse),
        (status = 400, description = "Invalid body or Stripe rejected the request"),
        (status = 503, description = "Customer store unavailable"),
        (status = 500, description = "Unknown server error")
    ),
    tag = "Payments"
)]
fn doc_cards_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_config_handler,
        doc_create_setup_intent_handler,
        doc_create_payment_intent_handler,
        doc_webhook_handler,
        doc_create_customer_handler,
        doc_create_invoice_handler,
        doc_charge_handler,
        doc_cards_handler
    ),
    components(
        schemas(
            ConfigResponse, SetupIntentResponse,
            CreatePaymentIntentRequest, CreatePaymentIntentResponse,
            CustomerRequest, CustomerResponse,
            ChargeRequest, ChargeResponse,
            CardsRequest, CardsResponse, CardSummary
        )
    ),
    tags(
        (name = "Payments", description = "Stripe payment flows"),
        (name = "Stripe Webhooks", description = "Stripe server-to-server notifications")
    )
)]
pub struct StripeApiDoc;
