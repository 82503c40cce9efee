//! # courier-core
//!
//! Core types and traits for the courier pricing and checkout engine.
//!
//! This crate provides:
//! - `Coordinate` and Haversine distance estimation
//! - `PricingSchedule` and `Quote` for delivery pricing
//! - `DeliveryRequest`, `DeliveryOrder`, and `CheckoutSession` for the
//!   checkout flow
//! - `PaymentStrategy` trait for payment providers
//! - `CourierError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use courier_core::{Coordinate, DeliveryOrder, DeliveryRequest, PricingSchedule};
//!
//! let pickup = Coordinate::new(40.4168, -3.7038)?;
//! let dropoff = Coordinate::new(40.4168, -3.6038)?;
//!
//! let distance = pickup.distance_km(&dropoff);
//! let quote = PricingSchedule::default().quote(distance)?;
//!
//! let order = DeliveryOrder::new(request, quote)?;
//! let session = strategy.create_checkout(&order, &success_url, &cancel_url).await?;
//!
//! // Redirect user to session.redirect_url
//! ```

pub mod delivery;
pub mod error;
pub mod geo;
pub mod pricing;
pub mod strategy;

// Re-exports for convenience
pub use delivery::{
    CheckoutSession, DeliveryOrder, DeliveryRequest, WebhookEvent, WebhookEventType, PRODUCT_NAME,
};
pub use error::{CourierError, CourierResult};
pub use geo::{haversine_km, Coordinate, EARTH_RADIUS_KM};
pub use pricing::{Currency, PricingSchedule, Quote, BASE_FEE, PER_KM_RATE};
pub use strategy::{BoxedPaymentStrategy, CheckoutUrls, PaymentStrategy};
