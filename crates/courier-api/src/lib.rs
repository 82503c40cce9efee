//! # courier-api
//!
//! HTTP API layer for courier-checkout-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for delivery pricing and checkout
//! - Webhook handler for payment events
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/checkout` | Price a delivery and open a checkout session |
//! | POST | `/api/v1/quote` | Price preview (no provider call) |
//! | GET | `/api/v1/pricing` | Canonical pricing schedule |
//! | POST | `/webhook/stripe` | Stripe webhook |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
