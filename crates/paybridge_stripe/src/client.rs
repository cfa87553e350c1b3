// --- File: crates/paybridge_stripe/src/client.rs ---
//! Thin client for the Stripe REST API.
//!
//! Requests are form-encoded and authenticated with the secret key as the
//! basic-auth user. Non-2xx responses are turned into `StripeError::ApiError`
//! from Stripe's error envelope.

use paybridge_common::HTTP_CLIENT;
use paybridge_config::StripeConfig;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::StripeError;
use crate::models::{
    CreateCustomer, CreateInvoice, CreateInvoiceItem, CreatePaymentIntent, CreateSetupIntent,
    Customer, EphemeralKey, Invoice, InvoiceItem, PaymentIntent, PaymentMethod, SetupIntent,
    StripeErrorEnvelope, StripeList,
};

/// Page size used when walking list endpoints.
const LIST_PAGE_SIZE: &str = "100";

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    ephemeral_key_version: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("ephemeral_key_version", &self.ephemeral_key_version)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Build a client from configuration, using the shared HTTP client.
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        Self::with_http_client(config, HTTP_CLIENT.clone())
    }

    pub fn with_http_client(
        config: &StripeConfig,
        http: reqwest::Client,
    ) -> Result<Self, StripeError> {
        if config.secret_key.trim().is_empty() {
            return Err(StripeError::ConfigError(
                "stripe.secret_key is empty".to_string(),
            ));
        }
        if config.api_base.trim().is_empty() {
            return Err(StripeError::ConfigError(
                "stripe.api_base is empty".to_string(),
            ));
        }

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            ephemeral_key_version: config.ephemeral_key_version.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .basic_auth(&self.secret_key, None::<&str>)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .basic_auth(&self.secret_key, None::<&str>)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, StripeError> {
        debug!("[Stripe] Sending {} request", what);
        let response = request.send().await?;
        decode_response(response, what).await
    }

    pub async fn create_customer(&self, params: &CreateCustomer) -> Result<Customer, StripeError> {
        let customer: Customer = self
            .send(self.post("customers").form(&params.to_form()), "create customer")
            .await?;
        info!("[Stripe] Created customer {}", customer.id);
        Ok(customer)
    }

    /// Ephemeral keys are pinned to the configured API version, which the
    /// mobile SDKs require.
    pub async fn create_ephemeral_key(&self, customer_id: &str) -> Result<EphemeralKey, StripeError> {
        let form = [("customer", customer_id)];
        self.send(
            self.post("ephemeral_keys")
                .header("Stripe-Version", &self.ephemeral_key_version)
                .form(&form),
            "create ephemeral key",
        )
        .await
    }

    pub async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, StripeError> {
        let intent: PaymentIntent = self
            .send(
                self.post("payment_intents").form(&params.to_form()),
                "create payment intent",
            )
            .await?;
        info!(
            "[Stripe] Created payment intent {} (status: {:?})",
            intent.id, intent.status
        );
        Ok(intent)
    }

    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        self.send(
            self.get(&format!("payment_intents/{}", id)),
            "retrieve payment intent",
        )
        .await
    }

    pub async fn create_setup_intent(
        &self,
        params: &CreateSetupIntent,
    ) -> Result<SetupIntent, StripeError> {
        self.send(
            self.post("setup_intents").form(&params.to_form()),
            "create setup intent",
        )
        .await
    }

    /// Lists every payment method of `method_type` attached to the customer,
    /// following `has_more` until the last page.
    pub async fn list_payment_methods(
        &self,
        customer_id: &str,
        method_type: &str,
    ) -> Result<Vec<PaymentMethod>, StripeError> {
        let mut methods = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let mut query = vec![
                ("customer", customer_id.to_string()),
                ("type", method_type.to_string()),
                ("limit", LIST_PAGE_SIZE.to_string()),
            ];
            if let Some(cursor) = &starting_after {
                query.push(("starting_after", cursor.clone()));
            }

            let page: StripeList<PaymentMethod> = self
                .send(
                    self.get("payment_methods").query(&query),
                    "list payment methods",
                )
                .await?;

            let has_more = page.has_more;
            starting_after = page.data.last().map(|m| m.id.clone());
            methods.extend(page.data);

            if !has_more || starting_after.is_none() {
                break;
            }
        }

        debug!(
            "[Stripe] Customer {} has {} payment methods of type {}",
            customer_id,
            methods.len(),
            method_type
        );
        Ok(methods)
    }

    pub async fn create_invoice_item(
        &self,
        params: &CreateInvoiceItem,
    ) -> Result<InvoiceItem, StripeError> {
        self.send(
            self.post("invoiceitems").form(&params.to_form()),
            "create invoice item",
        )
        .await
    }

    pub async fn create_invoice(&self, params: &CreateInvoice) -> Result<Invoice, StripeError> {
        self.send(self.post("invoices").form(&params.to_form()), "create invoice")
            .await
    }

    pub async fn finalize_invoice(&self, id: &str) -> Result<Invoice, StripeError> {
        self.send(
            self.post(&format!("invoices/{}/finalize", id)),
            "finalize invoice",
        )
        .await
    }
}

async fn decode_response<T: DeserializeOwned>(
    response: Response,
    what: &str,
) -> Result<T, StripeError> {
    let status = response.status();
    let body_text = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body_text)?);
    }

    warn!(
        "[Stripe] {} failed with HTTP status {}: {}",
        what, status, body_text
    );

    match serde_json::from_str::<StripeErrorEnvelope>(&body_text) {
        Ok(envelope) => Err(StripeError::ApiError {
            status_code: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message.unwrap_or(body_text),
            payment_intent_id: envelope.error.payment_intent.map(|pi| pi.id),
        }),
        Err(_) => Err(StripeError::UnexpectedResponse {
            status_code: status.as_u16(),
            body: body_text,
        }),
    }
}
