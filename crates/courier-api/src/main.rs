//! # Courier Checkout
//!
//! Pricing and payment-session service for courier deliveries.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//! export BASE_URL=https://courier.example.com
//!
//! # Run the server
//! courier-checkout
//! ```

use courier_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Pricing: base={} {} + {}/km",
        state.pricing.base_fee, state.pricing.currency, state.pricing.per_km_rate
    );
    info!("Payment provider: {}", state.strategy.provider_name());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Courier checkout service starting on http://{}", addr);

    if !is_prod {
        info!("Checkout: POST http://{}/api/v1/checkout", addr);
        info!("Quote:    POST http://{}/api/v1/quote", addr);
        info!("Webhook:  POST http://{}/webhook/stripe", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
