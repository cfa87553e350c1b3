// --- File: crates/paybridge_stripe/src/models.rs ---
//! Stripe objects as returned by the REST API, and the parameter sets sent to it.
//!
//! Only the fields this service reads are modelled; everything else in the
//! Stripe payload is ignored on decode.

use serde::Deserialize;

// --- Response objects ---

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct EphemeralKey {
    pub id: String,
    pub secret: String,
}

/// A payment intent. Also the shape of `data.object` in payment intent webhooks.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub receipt_email: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SetupIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CardDetails {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub exp_month: i64,
    #[serde(default)]
    pub exp_year: i64,
    /// `credit`, `debit`, `prepaid` or `unknown`
    #[serde(default)]
    pub funding: String,
    #[serde(default)]
    pub last4: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BillingDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A saved payment method. Also the shape of `data.object` in
/// `payment_method.attached` webhooks.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type", default)]
    pub method_type: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub card: Option<CardDetails>,
    #[serde(default)]
    pub billing_details: BillingDetails,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InvoiceItem {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub amount: i64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub charge: Option<String>,
}

/// One page of a Stripe list endpoint.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// Error envelope: `{"error": {"code", "message", "payment_intent": {...}}}`.
#[derive(Deserialize, Debug)]
pub(crate) struct StripeErrorEnvelope {
    pub error: StripeErrorBody,
}

#[derive(Deserialize, Debug)]
pub(crate) struct StripeErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<PaymentIntentRef>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct PaymentIntentRef {
    pub id: String,
}

// --- Request parameters ---

type Form = Vec<(String, String)>;

fn push(form: &mut Form, key: &str, value: impl Into<String>) {
    form.push((key.to_string(), value.into()));
}

fn push_opt(form: &mut Form, key: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        push(form, key, v);
    }
}

/// Parameters for `POST /v1/customers`. Empty values are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CreateCustomer {
    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        push_opt(&mut form, "name", self.name.as_deref());
        push_opt(&mut form, "email", self.email.as_deref());
        form
    }
}

/// Parameters for `POST /v1/payment_intents`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatePaymentIntent {
    pub amount: i64,
    pub currency: String,
    pub payment_method_types: Vec<String>,
    pub customer: Option<String>,
    pub payment_method: Option<String>,
    pub confirm: Option<bool>,
    pub off_session: Option<bool>,
    pub error_on_requires_action: Option<bool>,
}

impl CreatePaymentIntent {
    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        push(&mut form, "amount", self.amount.to_string());
        push(&mut form, "currency", self.currency.as_str());
        for (i, method) in self.payment_method_types.iter().enumerate() {
            push(&mut form, &format!("payment_method_types[{}]", i), method.as_str());
        }
        push_opt(&mut form, "customer", self.customer.as_deref());
        push_opt(&mut form, "payment_method", self.payment_method.as_deref());
        if let Some(confirm) = self.confirm {
            push(&mut form, "confirm", confirm.to_string());
        }
        if let Some(off_session) = self.off_session {
            push(&mut form, "off_session", off_session.to_string());
        }
        if let Some(error_on_requires_action) = self.error_on_requires_action {
            push(
                &mut form,
                "error_on_requires_action",
                error_on_requires_action.to_string(),
            );
        }
        // Canadian pre-authorized debits need a mandate.
        if self.payment_method_types.iter().any(|m| m == "acss_debit") {
            push(
                &mut form,
                "payment_method_options[acss_debit][mandate_options][payment_schedule]",
                "sporadic",
            );
            push(
                &mut form,
                "payment_method_options[acss_debit][mandate_options][transaction_type]",
                "personal",
            );
        }
        form
    }
}

/// Parameters for `POST /v1/setup_intents`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSetupIntent {
    pub customer: String,
    /// `on_session` or `off_session`
    pub usage: String,
}

impl CreateSetupIntent {
    pub fn on_session(customer: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            usage: "on_session".to_string(),
        }
    }

    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        push(&mut form, "customer", self.customer.as_str());
        push(&mut form, "usage", self.usage.as_str());
        form
    }
}

/// Parameters for `POST /v1/invoiceitems`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateInvoiceItem {
    pub customer: String,
    pub amount: i64,
    pub currency: String,
}

impl CreateInvoiceItem {
    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        push(&mut form, "customer", self.customer.as_str());
        push(&mut form, "amount", self.amount.to_string());
        push(&mut form, "currency", self.currency.as_str());
        form
    }
}

/// Parameters for `POST /v1/invoices`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateInvoice {
    pub customer: String,
    pub auto_advance: bool,
    pub collection_method: String,
}

impl CreateInvoice {
    /// An invoice Stripe finalizes and charges to the default payment method.
    pub fn charge_automatically(customer: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            auto_advance: true,
            collection_method: "charge_automatically".to_string(),
        }
    }

    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        push(&mut form, "customer", self.customer.as_str());
        push(&mut form, "auto_advance", self.auto_advance.to_string());
        push(&mut form, "collection_method", self.collection_method.as_str());
        form
    }
}
