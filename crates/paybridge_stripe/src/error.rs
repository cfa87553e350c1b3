// --- File: crates/paybridge_stripe/src/error.rs ---
use paybridge_common::{BridgeError, HttpStatusCode};
use thiserror::Error;

/// Stripe-specific error types.
#[derive(Error, Debug)]
pub enum StripeError {
    /// Error occurred during a Stripe API request
    #[error("Stripe API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Structured error returned by the Stripe API
    #[error("Stripe API returned an error: {message} (Status: {status_code})")]
    ApiError {
        status_code: u16,
        /// Machine-readable code such as `card_declined` or `authentication_required`
        code: Option<String>,
        message: String,
        /// The payment intent the error refers to, if any
        payment_intent_id: Option<String>,
    },

    /// Non-success response without Stripe's error envelope, e.g. from a proxy
    #[error("Unexpected Stripe response (Status: {status_code}): {body}")]
    UnexpectedResponse { status_code: u16, body: String },

    /// Error parsing Stripe API response
    #[error("Failed to parse Stripe API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or incomplete Stripe configuration
    #[error("Stripe configuration missing or incomplete: {0}")]
    ConfigError(String),

    /// Internal processing error
    #[error("Internal processing error: {0}")]
    InternalError(String),
}

impl StripeError {
    /// The payment intent named by a structured API error.
    pub fn payment_intent_id(&self) -> Option<&str> {
        match self {
            StripeError::ApiError {
                payment_intent_id, ..
            } => payment_intent_id.as_deref(),
            _ => None,
        }
    }
}

/// Convert StripeError to BridgeError
impl From<StripeError> for BridgeError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::RequestError(e) => {
                BridgeError::HttpError(format!("Stripe request error: {}", e))
            }
            StripeError::ApiError { message, .. } => BridgeError::GatewayError(message),
            StripeError::UnexpectedResponse { status_code, body } => BridgeError::HttpError(
                format!("Stripe returned HTTP {}: {}", status_code, body),
            ),
            StripeError::ParseError(e) => {
                BridgeError::ParseError(format!("Stripe response parse error: {}", e))
            }
            StripeError::ConfigError(msg) => BridgeError::ConfigError(msg),
            StripeError::InternalError(msg) => {
                BridgeError::InternalError(format!("Stripe internal error: {}", msg))
            }
        }
    }
}

/// Structured gateway errors are the caller's problem; everything else is ours.
impl HttpStatusCode for StripeError {
    fn status_code(&self) -> u16 {
        match self {
            StripeError::ApiError { .. } => 400,
            _ => 500,
        }
    }
}
