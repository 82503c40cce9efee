//! # Delivery Order Types
//!
//! Request and session types for the checkout flow. These are transient
//! request/response values; persistence of the resulting order is the
//! surrounding application's responsibility.

use crate::error::{CourierError, CourierResult};
use crate::geo::Coordinate;
use crate::pricing::Quote;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Human-readable product name shown on the provider's checkout page
pub const PRODUCT_NAME: &str = "Courier Delivery Service";

/// A delivery request as collected from the customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// Pickup coordinate
    pub pickup: Coordinate,

    /// Dropoff coordinate
    pub dropoff: Coordinate,

    /// Pickup address label (free text)
    pub pickup_label: String,

    /// Dropoff address label (free text)
    pub dropoff_label: String,

    /// What is being delivered
    pub item_description: String,

    /// Customer email, used for billing-customer lookup
    pub customer_email: String,
}

impl DeliveryRequest {
    /// Check that all required fields are present and plausible.
    ///
    /// Coordinates are validated at construction; this covers the free-text
    /// fields and the email.
    pub fn validate(&self) -> CourierResult<()> {
        if self.pickup_label.trim().is_empty() {
            return Err(CourierError::InvalidInput(
                "Pickup location is required".to_string(),
            ));
        }
        if self.dropoff_label.trim().is_empty() {
            return Err(CourierError::InvalidInput(
                "Dropoff location is required".to_string(),
            ));
        }
        if self.item_description.trim().is_empty() {
            return Err(CourierError::InvalidInput(
                "Item description is required".to_string(),
            ));
        }
        if !is_plausible_email(&self.customer_email) {
            return Err(CourierError::InvalidInput(format!(
                "Invalid customer email: {}",
                self.customer_email
            )));
        }
        Ok(())
    }
}

/// Minimal plausibility check: one `@` with non-empty local part and a
/// domain containing a dot. Full RFC validation is the provider's problem.
fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// A validated, priced delivery ready to be checked out
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOrder {
    /// Unique delivery id (generated)
    pub id: String,

    /// The validated request
    pub request: DeliveryRequest,

    /// The computed price quote
    pub quote: Quote,

    /// Caller-supplied idempotency key. Absent by default: two identical
    /// requests create two distinct checkout sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl DeliveryOrder {
    /// Build an order from a request and its quote, validating the request.
    pub fn new(request: DeliveryRequest, quote: Quote) -> CourierResult<Self> {
        request.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            request,
            quote,
            idempotency_key: None,
            created_at: Utc::now(),
        })
    }

    /// Set a caller-supplied idempotency key
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Line-item description shown on the checkout page
    pub fn description(&self) -> String {
        format!(
            "Delivery from {} to {} ({:.2} km)",
            self.request.pickup_label, self.request.dropoff_label, self.quote.distance_km
        )
    }

    /// Metadata attached to the provider session for later reconciliation
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut meta = HashMap::new();
        meta.insert("delivery_id".to_string(), self.id.clone());
        meta.insert(
            "pickup_location".to_string(),
            self.request.pickup_label.clone(),
        );
        meta.insert(
            "dropoff_location".to_string(),
            self.request.dropoff_label.clone(),
        );
        meta.insert(
            "item_description".to_string(),
            self.request.item_description.clone(),
        );
        meta.insert("distance_km".to_string(), self.quote.display_distance());
        meta.insert(
            "customer_email".to_string(),
            self.request.customer_email.clone(),
        );
        meta
    }
}

/// A checkout session created by a payment provider.
///
/// Created once per request, never mutated. Expiry is enforced by the
/// provider.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    /// Provider's session id
    pub session_id: String,

    /// Our delivery id
    pub delivery_id: String,

    /// Provider name (e.g., "stripe")
    pub provider: String,

    /// URL to redirect the customer to for payment
    pub redirect_url: String,

    /// The quote this session was priced from
    pub quote: Quote,

    /// Resolved billing-customer id, when one already existed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    /// When the session expires (provider policy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Metadata carried on the provider session
    pub metadata: HashMap<String, String>,
}

/// Webhook event types the courier flow cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Checkout session completed
    CheckoutCompleted,
    /// Payment succeeded
    PaymentSucceeded,
    /// Payment failed
    PaymentFailed,
    /// Refund issued
    RefundIssued,
    /// Unknown event (passthrough)
    Unknown(String),
}

/// A verified, parsed webhook event
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    /// Event id from the provider
    pub event_id: String,

    /// Event type
    pub event_type: WebhookEventType,

    /// Provider name
    pub provider: String,

    /// Related session id (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Related payment intent id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    /// Customer email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Amount paid in the currency's smallest unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<i64>,

    /// Raw event data (for debugging and downstream extraction)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,
}
