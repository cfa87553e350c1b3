// --- File: crates/services/paybridge_backend/src/app_state.rs ---
use paybridge_config::AppConfig;
use paybridge_store::{SqlCustomerMapRepository, StoreClient, CUSTOMERS_BUCKET};
use paybridge_stripe::{PaymentGateway, StripeClient, StripeError, StripeState};
use std::sync::Arc;
use tracing::{error, info};

/// Application state shared across all routes.
///
/// Owns the store handle so it can be closed after the server stops. The
/// handlers see it through `stripe`, which carries everything they need.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when the store could not be opened; store-backed routes answer 503.
    pub store: Option<StoreClient>,
    pub stripe: Arc<StripeState>,
}

impl AppState {
    /// Builds the state with the Stripe REST client.
    ///
    /// Fails only if the Stripe configuration is unusable. A store that cannot
    /// be opened is logged and left out.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, StripeError> {
        let gateway = Arc::new(StripeClient::new(&config.stripe)?);
        Ok(Self::with_gateway(config, gateway).await)
    }

    pub async fn with_gateway(config: Arc<AppConfig>, gateway: Arc<dyn PaymentGateway>) -> Self {
        let store = match StoreClient::open(&config.store, &[CUSTOMERS_BUCKET]).await {
            Ok(store) => Some(store),
            Err(e) => {
                error!(
                    "Customer store at {} is unavailable, continuing without it: {}",
                    config.store.path, e
                );
                None
            }
        };

        let customers = store.clone().map(SqlCustomerMapRepository::new);
        let stripe = Arc::new(StripeState::new(config.clone(), gateway, customers));

        Self {
            config,
            store,
            stripe,
        }
    }

    /// Releases the store. Call once the server has stopped.
    pub async fn shutdown(&self) {
        if let Some(store) = &self.store {
            store.close().await;
        }
        info!("Application state shut down");
    }
}
