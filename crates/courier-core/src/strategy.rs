//! # Payment Strategy Trait
//!
//! Seam between the pricing core and payment providers. The HTTP layer
//! holds a boxed strategy, so provider calls can be mocked in tests and a
//! second provider can be added without touching the handlers.

use crate::delivery::{CheckoutSession, DeliveryOrder, WebhookEvent};
use crate::error::CourierResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Payment provider interface for the courier checkout flow
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Create a hosted checkout session for a priced delivery.
    ///
    /// # Arguments
    /// * `order` - The validated, priced delivery
    /// * `success_url` - Redirect after successful payment
    /// * `cancel_url` - Redirect if the customer cancels
    async fn create_checkout(
        &self,
        order: &DeliveryOrder,
        success_url: &str,
        cancel_url: &str,
    ) -> CourierResult<CheckoutSession>;

    /// Verify a webhook signature and parse the event.
    async fn verify_webhook(&self, payload: &[u8], signature: &str)
        -> CourierResult<WebhookEvent>;

    /// Provider name for logging and routing
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment strategy (dynamic dispatch)
pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;

/// Success and cancel URLs used in checkout
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Base URL of the application (e.g., "https://courier.example.com")
    pub base_url: String,
    /// Success page path
    pub success_path: String,
    /// Cancel page path
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            success_path: "/checkout/success".to_string(),
            cancel_path: "/checkout/cancel".to_string(),
        }
    }

    pub fn success_url(&self) -> String {
        format!("{}{}", self.base_url, self.success_path)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
