//! # Routes
//!
//! Axum router configuration for the courier checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, HeaderName},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - API:
///   - POST /api/v1/checkout - Price a delivery and open a checkout session
///   - POST /api/v1/quote    - Price preview, no provider call
///   - GET  /api/v1/pricing  - Canonical pricing schedule
///
/// - Webhooks:
///   - POST /webhook/stripe - Stripe webhook handler
///
/// - Static pages:
///   - GET /checkout/success - Success page
///   - GET /checkout/cancel - Cancel page
pub fn create_router(state: AppState) -> Router {
    // Browser clients call this API from arbitrary origins; the CORS layer
    // also answers OPTIONS preflights.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    let checkout_pages = Router::new()
        .route("/success", get(handlers::checkout_success))
        .route("/cancel", get(handlers::checkout_cancel));

    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route("/quote", post(handlers::quote))
        .route("/pricing", get(handlers::pricing));

    // Webhook routes must accept the raw body for signature verification
    let webhook_routes = Router::new().route("/stripe", post(handlers::stripe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/checkout", checkout_pages)
        .nest("/api/v1", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
