// --- File: crates/paybridge_common/src/http.rs ---
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{error, warn};

use crate::error::{BridgeError, HttpStatusCode};

// Include the client module
pub mod client;

/// Extension trait for BridgeError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for BridgeError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            error!("Request failed ({}): {}", status_code.as_u16(), self);
        } else {
            warn!("Request rejected ({}): {}", status_code.as_u16(), self);
        }

        let body = Json(json!({
            "error": {
                "message": self.public_message(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for BridgeError to make it easier to use in Axum handlers.
impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// JSON request body extractor that answers malformed input with a 400 and the
/// standard error body.
///
/// Unlike `axum::Json` it does not insist on a `Content-Type` header; browser
/// and mobile clients of this service do not always send one.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BridgeError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| BridgeError::ValidationError(rejection.body_text()))?;

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|err| BridgeError::ValidationError(format!("malformed JSON body: {err}")))
    }
}
