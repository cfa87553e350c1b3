// --- File: crates/services/paybridge_backend/src/lib.rs ---
//! Router assembly for the PayBridge server.

pub mod app_state;

use axum::{extract::State, routing::get, Router};
use paybridge_store::StoreClient;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

use crate::app_state::AppState;

/// Liveness probe. Store readiness only goes to the log.
async fn health_handler(State(store): State<Option<StoreClient>>) -> &'static str {
    match &store {
        Some(store) => {
            if !store.is_healthy().await {
                warn!("Health check: customer store is not answering");
            }
        }
        None => warn!("Health check: customer store is not open"),
    }
    "OK"
}

/// Builds the complete application router.
pub fn build_app(state: &AppState) -> Router {
    let health_router = Router::new()
        .route("/health", get(health_handler))
        .with_state(state.store.clone());

    #[allow(unused_mut)] // only mutated with the openapi feature
    let mut app = health_router.merge(paybridge_stripe::routes(state.stripe.clone()));

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use paybridge_stripe::doc::StripeApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "PayBridge API",
                version = "0.1.0",
                description = "Payment bridge between browser clients and Stripe",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            components(),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(StripeApiDoc::openapi());
        info!("Adding Swagger UI at /docs");

        app = app.merge(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi_doc));
    }

    let app = match &state.config.server.static_dir {
        Some(dir) => {
            info!("Serving static files from {}", dir);
            app.fallback_service(ServeDir::new(dir))
        }
        None => app,
    };

    app.layer(TraceLayer::new_for_http())
}
