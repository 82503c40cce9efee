//! # courier-stripe
//!
//! Stripe payment strategy for courier-checkout-rs.
//!
//! Implements the courier checkout flow against Stripe's hosted Checkout
//! Sessions API:
//!
//! - Billing-customer lookup by email (existing customers are attached to
//!   the session, otherwise the email prefills checkout)
//! - Session creation with a single line item at the quoted delivery total
//! - Webhook signature verification and event dispatch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier_stripe::StripeCheckoutStrategy;
//! use courier_core::PaymentStrategy;
//!
//! let strategy = StripeCheckoutStrategy::from_env()?;
//!
//! let session = strategy.create_checkout(
//!     &order,
//!     "https://example.com/checkout/success",
//!     "https://example.com/checkout/cancel",
//! ).await?;
//!
//! // Redirect user to session.redirect_url
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::StripeCheckoutStrategy;
pub use config::StripeConfig;
pub use webhook::{
    dispatch_webhook_event, CheckoutCompletedData, LoggingWebhookHandler, WebhookHandler,
};
