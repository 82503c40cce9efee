//! # Application State
//!
//! Shared state for the Axum application: the payment strategy, the
//! authoritative pricing schedule, and server configuration.

use courier_core::{BoxedPaymentStrategy, CheckoutUrls, PricingSchedule};
use courier_stripe::StripeCheckoutStrategy;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for checkout redirect callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment provider strategy
    pub strategy: BoxedPaymentStrategy,
    /// Authoritative pricing schedule
    pub pricing: PricingSchedule,
    /// Checkout redirect URLs
    pub urls: CheckoutUrls,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create state from the environment with the Stripe strategy
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let strategy = StripeCheckoutStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::with_strategy(config, Arc::new(strategy)))
    }

    /// Create state with an explicit strategy (used by tests)
    pub fn with_strategy(config: AppConfig, strategy: BoxedPaymentStrategy) -> Self {
        let urls = CheckoutUrls::new(&config.base_url);
        Self {
            strategy,
            pricing: PricingSchedule::default(),
            urls,
            config,
        }
    }

    /// Success URL with the provider's session id placeholder
    pub fn success_url(&self) -> String {
        format!("{}?session_id={{CHECKOUT_SESSION_ID}}", self.urls.success_url())
    }

    /// Cancel URL
    pub fn cancel_url(&self) -> String {
        self.urls.cancel_url()
    }
}
