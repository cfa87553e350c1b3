// --- File: crates/paybridge_stripe/src/webhook.rs ---
//! Stripe webhook decoding and dispatch.
//!
//! Signatures are not verified. The dispatcher only decodes the envelope,
//! switches on the event type and logs what it saw.

use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::{PaymentIntent, PaymentMethod};

/// Largest webhook body that is read; anything bigger is refused.
pub const MAX_WEBHOOK_BYTES: usize = 65_536;

/// Event types with a dedicated branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WebhookEventType {
    PaymentIntentSucceeded,
    PaymentIntentCreated,
    PaymentMethodAttached,
    Unknown(String),
}

impl FromStr for WebhookEventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.created" => Self::PaymentIntentCreated,
            "payment_method.attached" => Self::PaymentMethodAttached,
            other => Self::Unknown(other.to_string()),
        })
    }
}

impl WebhookEventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentCreated => "payment_intent.created",
            Self::PaymentMethodAttached => "payment_method.attached",
            Self::Unknown(other) => other,
        }
    }
}

/// The outer Stripe event object. Only `type` and `data.object` are read.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub data: WebhookEventData,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct WebhookEventData {
    /// The object the event is about; its shape depends on the event type.
    #[serde(default)]
    pub object: serde_json::Value,
}

/// What the dispatcher did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    PaymentSucceeded {
        payment_intent_id: String,
        /// The intent is the one this process created last.
        matched_last_created: bool,
    },
    PaymentIntentCreated {
        payment_intent_id: String,
    },
    PaymentMethodAttached {
        payment_method_id: String,
    },
    Unhandled {
        event_type: String,
    },
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Failed to parse webhook body: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Failed to parse {event_type} object: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

fn decode_object<T: serde::de::DeserializeOwned>(
    event_type: &WebhookEventType,
    object: serde_json::Value,
) -> Result<T, WebhookError> {
    serde_json::from_value(object).map_err(|source| WebhookError::Payload {
        event_type: event_type.as_str().to_string(),
        source,
    })
}

/// Decodes `payload` and runs the branch for its event type.
///
/// `last_payment_intent` holds the id of the most recent payment intent this
/// process created; a success event for it is logged as the expected payment.
pub async fn dispatch(
    payload: &[u8],
    last_payment_intent: &RwLock<Option<String>>,
) -> Result<WebhookOutcome, WebhookError> {
    let event: WebhookEvent = serde_json::from_slice(payload).map_err(WebhookError::Envelope)?;
    let event_type = WebhookEventType::from_str(&event.event_type)
        .unwrap_or_else(|never| match never {});

    info!(
        "Processing Stripe event {} of type {}",
        event.id.as_deref().unwrap_or("<no id>"),
        event_type.as_str()
    );

    match event_type {
        WebhookEventType::PaymentIntentSucceeded => {
            let intent: PaymentIntent = decode_object(&event_type, event.data.object)?;
            let matched = last_payment_intent.read().await.as_deref() == Some(intent.id.as_str());
            if matched {
                info!("The payment for intent {} was successful", intent.id);
            }
            info!(
                "PaymentIntent {} succeeded: customer={:?} amount={} receipt_email={:?}",
                intent.id, intent.customer, intent.amount, intent.receipt_email
            );
            Ok(WebhookOutcome::PaymentSucceeded {
                payment_intent_id: intent.id,
                matched_last_created: matched,
            })
        }
        WebhookEventType::PaymentIntentCreated => {
            let intent: PaymentIntent = decode_object(&event_type, event.data.object)?;
            info!("PaymentIntent {} created", intent.id);
            Ok(WebhookOutcome::PaymentIntentCreated {
                payment_intent_id: intent.id,
            })
        }
        WebhookEventType::PaymentMethodAttached => {
            let method: PaymentMethod = decode_object(&event_type, event.data.object)?;
            info!(
                "PaymentMethod {} was attached to customer {:?}",
                method.id, method.customer
            );
            Ok(WebhookOutcome::PaymentMethodAttached {
                payment_method_id: method.id,
            })
        }
        WebhookEventType::Unknown(event_type) => {
            warn!("Unhandled Stripe event type: {}", event_type);
            Ok(WebhookOutcome::Unhandled { event_type })
        }
    }
}
