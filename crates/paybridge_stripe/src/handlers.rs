// --- File: crates/paybridge_stripe/src/handlers.rs ---
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::StatusCode,
    Json,
};
use paybridge_common::{not_found, require_field, BridgeError, JsonBody};
use paybridge_config::AppConfig;
use paybridge_store::{CustomerMapRepository, SqlCustomerMapRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::StripeError;
use crate::models::{
    CreateCustomer, CreateInvoice, CreateInvoiceItem, CreatePaymentIntent, CreateSetupIntent,
    PaymentMethod,
};
use crate::provisioning::{ensure_customer, ProvisioningLocks};
use crate::service::PaymentGateway;
use crate::webhook::{self, MAX_WEBHOOK_BYTES};

// --- State for Stripe Handlers ---

/// Everything the handlers share: configuration, the customer store (absent
/// when it could not be opened), the gateway, the provisioning locks and the
/// id of the last payment intent created by this process.
pub struct StripeState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub customers: Option<SqlCustomerMapRepository>,
    pub provisioning: ProvisioningLocks,
    pub last_payment_intent: RwLock<Option<String>>,
}

impl StripeState {
    pub fn new(
        config: Arc<AppConfig>,
        gateway: Arc<dyn PaymentGateway>,
        customers: Option<SqlCustomerMapRepository>,
    ) -> Self {
        Self {
            config,
            gateway,
            customers,
            provisioning: ProvisioningLocks::new(),
            last_payment_intent: RwLock::new(None),
        }
    }

    fn customers(&self) -> Result<&SqlCustomerMapRepository, BridgeError> {
        self.customers.as_ref().ok_or_else(|| {
            BridgeError::StoreUnavailable("customer store is not open".to_string())
        })
    }

    /// Id of the last payment intent created through `/create-payment-intent`.
    pub async fn last_payment_intent(&self) -> Option<String> {
        self.last_payment_intent.read().await.clone()
    }
}

// --- Request / response bodies ---

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ConfigResponse {
    #[serde(rename = "publishableKey")]
    #[cfg_attr(feature = "openapi", schema(example = "pk_test_51..."))]
    pub publishable_key: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SetupIntentResponse {
    #[serde(rename = "setupClientSecret")]
    pub setup_client_secret: String,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePaymentIntentRequest {
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(example = "usd"))]
    pub currency: String,
    #[serde(rename = "paymentMethodType", default)]
    #[cfg_attr(feature = "openapi", schema(example = "card"))]
    pub payment_method_type: String,
    #[serde(rename = "customerName", default)]
    #[cfg_attr(feature = "openapi", schema(example = "Jenny Rosen"))]
    pub customer_name: String,
    #[serde(rename = "customerEmail", default)]
    #[cfg_attr(feature = "openapi", schema(example = "jenny.rosen@example.com"))]
    pub customer_email: String,
    #[serde(rename = "userID", default)]
    #[cfg_attr(feature = "openapi", schema(example = "user-42"))]
    pub user_id: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePaymentIntentResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "customerID")]
    pub customer_id: String,
    #[serde(rename = "ephemeralKey")]
    pub ephemeral_key: String,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CustomerRequest {
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(example = "Jenny Rosen"))]
    pub name: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(example = "jenny.rosen@example.com"))]
    pub email: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CustomerResponse {
    #[serde(rename = "customerID")]
    pub customer_id: String,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChargeRequest {
    #[serde(rename = "paymentMethodID", default)]
    #[cfg_attr(feature = "openapi", schema(example = "pm_1J7aNYLl6Dh4Ry32t69VPmZE"))]
    pub payment_method_id: String,
    #[serde(rename = "userID", default)]
    pub user_id: String,
    #[serde(rename = "offSession", default)]
    pub off_session: bool,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChargeResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

fn default_method_type() -> String {
    "card".to_string()
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CardsRequest {
    #[serde(rename = "userID", default)]
    pub user_id: String,
    /// Payment method type to list, `card` when omitted.
    #[serde(rename = "type", default = "default_method_type")]
    pub method_type: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CardSummary {
    #[serde(rename = "paymentMethodID")]
    pub payment_method_id: String,
    pub brand: String,
    pub month: i64,
    pub year: i64,
    /// Card funding: credit, debit, prepaid or unknown
    #[serde(rename = "balanceType")]
    pub balance_type: String,
    #[serde(rename = "cardHolder")]
    pub card_holder: String,
    #[serde(rename = "lastFourDigits")]
    pub last_four_digits: String,
}

impl CardSummary {
    /// `None` for payment methods without card details.
    fn from_payment_method(method: PaymentMethod) -> Option<Self> {
        let card = method.card?;
        Some(Self {
            payment_method_id: method.id,
            brand: card.brand,
            month: card.exp_month,
            year: card.exp_year,
            balance_type: card.funding,
            card_holder: method.billing_details.name.unwrap_or_default(),
            last_four_digits: card.last4,
        })
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CardsResponse {
    pub cards: Vec<CardSummary>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn client_secret(secret: Option<String>, what: &str) -> Result<String, StripeError> {
    secret.ok_or_else(|| StripeError::InternalError(format!("{} has no client secret", what)))
}

// --- Handlers ---

/// GET /config
pub async fn config_handler(State(state): State<Arc<StripeState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        publishable_key: state.config.stripe.publishable_key.clone(),
    })
}

/// GET /create-setup-intent
///
/// Creates an anonymous customer and a setup intent for it, so a browser can
/// save a card without paying.
pub async fn create_setup_intent_handler(
    State(state): State<Arc<StripeState>>,
) -> Result<Json<SetupIntentResponse>, BridgeError> {
    let customer = state
        .gateway
        .create_customer(&CreateCustomer::default())
        .await?;
    let setup_intent = state
        .gateway
        .create_setup_intent(&CreateSetupIntent::on_session(customer.id))
        .await?;

    Ok(Json(SetupIntentResponse {
        setup_client_secret: client_secret(setup_intent.client_secret, "setup intent")?,
    }))
}

/// POST /create-payment-intent
pub async fn create_payment_intent_handler(
    State(state): State<Arc<StripeState>>,
    JsonBody(payload): JsonBody<CreatePaymentIntentRequest>,
) -> Result<Json<CreatePaymentIntentResponse>, BridgeError> {
    require_field("userID", &payload.user_id)?;
    require_field("currency", &payload.currency)?;
    require_field("paymentMethodType", &payload.payment_method_type)?;
    info!(
        "Payment intent requested by user {} ({} / {})",
        payload.user_id, payload.currency, payload.payment_method_type
    );

    let customers = state.customers()?;
    let customer_id = ensure_customer(
        &state.provisioning,
        customers,
        state.gateway.as_ref(),
        &payload.user_id,
        &CreateCustomer {
            name: non_empty(&payload.customer_name),
            email: non_empty(&payload.customer_email),
        },
    )
    .await?;

    let ephemeral_key = state.gateway.create_ephemeral_key(&customer_id).await?;

    let intent = state
        .gateway
        .create_payment_intent(&CreatePaymentIntent {
            amount: state.config.stripe.payment_amount,
            currency: payload.currency,
            payment_method_types: vec![payload.payment_method_type],
            customer: Some(customer_id.clone()),
            ..Default::default()
        })
        .await?;

    *state.last_payment_intent.write().await = Some(intent.id.clone());

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: client_secret(intent.client_secret, "payment intent")?,
        customer_id,
        ephemeral_key: ephemeral_key.secret,
    }))
}

/// POST /webhook
///
/// Bodies over 64 KiB, or bodies that cannot be read, get a 503 and are not
/// processed. Undecodable events get a 400.
pub async fn webhook_handler(State(state): State<Arc<StripeState>>, body: Body) -> StatusCode {
    let payload = match to_bytes(body, MAX_WEBHOOK_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error reading webhook body: {}", e);
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    };

    match webhook::dispatch(&payload, &state.last_payment_intent).await {
        Ok(outcome) => {
            info!("Webhook handled: {:?}", outcome);
            StatusCode::OK
        }
        Err(e) => {
            warn!("Rejected webhook: {}", e);
            StatusCode::BAD_REQUEST
        }
    }
}

/// POST /customer
pub async fn create_customer_handler(
    State(state): State<Arc<StripeState>>,
    JsonBody(payload): JsonBody<CustomerRequest>,
) -> Result<Json<CustomerResponse>, BridgeError> {
    require_field("name", &payload.name)?;

    let customer = state
        .gateway
        .create_customer(&CreateCustomer {
            name: non_empty(&payload.name),
            email: non_empty(&payload.email),
        })
        .await?;

    Ok(Json(CustomerResponse {
        customer_id: customer.id,
    }))
}

/// POST /create-invoice
///
/// Bills the configured demo customer: one invoice item, one invoice charged
/// automatically, then finalized.
pub async fn create_invoice_handler(
    State(state): State<Arc<StripeState>>,
) -> Result<StatusCode, BridgeError> {
    let stripe = &state.config.stripe;
    let customer = stripe.demo_customer_id.as_str();

    let item = state
        .gateway
        .create_invoice_item(&CreateInvoiceItem {
            customer: customer.to_string(),
            amount: stripe.invoice_amount,
            currency: stripe.invoice_currency.clone(),
        })
        .await?;
    info!("Created invoice item {} for {:?}", item.id, item.customer);

    let invoice = state
        .gateway
        .create_invoice(&CreateInvoice::charge_automatically(customer))
        .await?;
    let finalized = state.gateway.finalize_invoice(&invoice.id).await?;
    info!(
        "Finalized invoice {} (status: {:?}, charge: {:?})",
        finalized.id, finalized.status, finalized.charge
    );

    Ok(StatusCode::OK)
}

/// POST /charge
///
/// Confirms a payment immediately against a saved payment method. When the
/// gateway refuses and names the payment intent it created, that intent is
/// fetched and logged before the refusal is returned.
pub async fn charge_handler(
    State(state): State<Arc<StripeState>>,
    JsonBody(payload): JsonBody<ChargeRequest>,
) -> Result<Json<ChargeResponse>, BridgeError> {
    require_field("userID", &payload.user_id)?;
    require_field("paymentMethodID", &payload.payment_method_id)?;

    let customer_id = state
        .customers()?
        .get_customer(&payload.user_id)
        .await?
        .ok_or_else(|| not_found(format!("no customer stored for user {}", payload.user_id)))?;

    let params = CreatePaymentIntent {
        amount: state.config.stripe.charge_amount,
        currency: state.config.stripe.charge_currency.clone(),
        payment_method_types: Vec::new(),
        customer: Some(customer_id),
        payment_method: Some(payload.payment_method_id),
        confirm: Some(true),
        off_session: Some(payload.off_session),
        error_on_requires_action: Some(true),
    };

    match state.gateway.create_payment_intent(&params).await {
        Ok(intent) => Ok(Json(ChargeResponse {
            client_secret: client_secret(intent.client_secret, "payment intent")?,
        })),
        Err(err) => {
            if let StripeError::ApiError {
                code,
                payment_intent_id: Some(intent_id),
                ..
            } = &err
            {
                warn!("Charge refused with code {:?} for intent {}", code, intent_id);
                match state.gateway.retrieve_payment_intent(intent_id).await {
                    Ok(intent) => info!(
                        "Refused payment intent {} has status {:?}",
                        intent.id, intent.status
                    ),
                    Err(e) => warn!("Could not retrieve payment intent {}: {}", intent_id, e),
                }
            }
            Err(err.into())
        }
    }
}

/// POST /cards
///
/// A user without a stored customer has no cards.
pub async fn cards_handler(
    State(state): State<Arc<StripeState>>,
    JsonBody(payload): JsonBody<CardsRequest>,
) -> Result<Json<CardsResponse>, BridgeError> {
    require_field("userID", &payload.user_id)?;

    let Some(customer_id) = state.customers()?.get_customer(&payload.user_id).await? else {
        info!("User {} has no customer, returning no cards", payload.user_id);
        return Ok(Json(CardsResponse { cards: Vec::new() }));
    };

    let methods = state
        .gateway
        .list_payment_methods(&customer_id, &payload.method_type)
        .await?;

    let cards = methods
        .into_iter()
        .filter_map(CardSummary::from_payment_method)
        .collect();

    Ok(Json(CardsResponse { cards }))
}
