//! # Stripe Checkout Sessions
//!
//! Implementation of the courier checkout flow against Stripe's Checkout
//! Sessions API: billing-customer lookup by email, then session creation
//! with a single line item at the quoted total.

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use courier_core::{
    CheckoutSession, CourierError, CourierResult, DeliveryOrder, PaymentStrategy, WebhookEvent,
    PRODUCT_NAME,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe Checkout Session strategy
///
/// Uses Stripe's hosted checkout page; card data never touches this
/// service.
pub struct StripeCheckoutStrategy {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutStrategy {
    /// Create a new Stripe checkout strategy
    pub fn new(config: StripeConfig) -> CourierResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CourierError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CourierResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    /// Look up an existing billing customer by email.
    ///
    /// At most one match is expected; the first is taken. A missing
    /// customer is not an error.
    #[instrument(skip(self))]
    pub async fn find_customer_by_email(&self, email: &str) -> CourierResult<Option<String>> {
        let url = format!("{}/v1/customers", self.config.api_base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await
            .map_err(|e| CourierError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CourierError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_stripe_error(status.as_u16(), &body));
        }

        let list: StripeCustomerList = serde_json::from_str(&body).map_err(|e| {
            CourierError::Serialization(format!("Failed to parse customer list: {}", e))
        })?;

        let customer_id = list.data.into_iter().next().map(|c| c.id);
        debug!("Customer lookup: found={}", customer_id.is_some());

        Ok(customer_id)
    }
}

#[async_trait]
impl PaymentStrategy for StripeCheckoutStrategy {
    #[instrument(skip(self, order), fields(delivery_id = %order.id, distance_km = order.quote.distance_km))]
    async fn create_checkout(
        &self,
        order: &DeliveryOrder,
        success_url: &str,
        cancel_url: &str,
    ) -> CourierResult<CheckoutSession> {
        let unit_amount = order.quote.total_minor_units();
        if unit_amount <= 0 {
            return Err(CourierError::InvalidInput(format!(
                "Quoted amount must be positive, got {} minor units",
                unit_amount
            )));
        }

        // Customer lookup must complete first: its result decides whether
        // the session is attached to an existing customer or a bare email.
        let customer_id = self
            .find_customer_by_email(&order.request.customer_email)
            .await?;

        let metadata = order.metadata();

        debug!(
            "Creating Stripe checkout session: amount={} {}, customer={:?}",
            unit_amount,
            order.quote.currency.as_str(),
            customer_id
        );

        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                order.quote.currency.as_str().to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                PRODUCT_NAME.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                order.description(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];

        match &customer_id {
            Some(id) => form_params.push(("customer".to_string(), id.clone())),
            None => form_params.push((
                "customer_email".to_string(),
                order.request.customer_email.clone(),
            )),
        }

        for (key, value) in &metadata {
            form_params.push((format!("metadata[{}]", key), value.clone()));
        }

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version);

        // Only caller-supplied keys are threaded through: without one, two
        // identical requests create two distinct sessions.
        if let Some(key) = &order.idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request
            .form(&form_params)
            .send()
            .await
            .map_err(|e| CourierError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CourierError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);
            return Err(parse_stripe_error(status.as_u16(), &body));
        }

        let session: StripeCheckoutSessionResponse = serde_json::from_str(&body).map_err(|e| {
            CourierError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        info!(
            "Created Stripe checkout session: id={}, total={}",
            session.id,
            order.quote.display_total()
        );

        let expires_at = session
            .expires_at
            .map(|ts| DateTime::from_timestamp(ts, 0).unwrap_or(Utc::now() + Duration::hours(24)));

        Ok(CheckoutSession {
            session_id: session.id,
            delivery_id: order.id.clone(),
            provider: "stripe".to_string(),
            redirect_url: session.url,
            quote: order.quote,
            customer_id: session.customer.or(customer_id),
            expires_at,
            created_at: Utc::now(),
            metadata,
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> CourierResult<WebhookEvent> {
        let secret = self.config.webhook_secret.as_deref().ok_or_else(|| {
            CourierError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
        })?;

        crate::webhook::verify_and_parse(secret, payload, signature)
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

/// Map a non-2xx Stripe response body to a typed error, keeping the
/// provider's message when it parses.
fn parse_stripe_error(status: u16, body: &str) -> CourierError {
    if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(body) {
        return CourierError::Provider {
            provider: "stripe".to_string(),
            message: error_response.error.message,
        };
    }

    CourierError::Provider {
        provider: "stripe".to_string(),
        message: format!("HTTP {}: {}", status, body),
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCustomerList {
    #[serde(default)]
    data: Vec<StripeCustomer>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    url: String,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{Coordinate, DeliveryRequest, PricingSchedule};
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_order() -> DeliveryOrder {
        let request = DeliveryRequest {
            pickup: Coordinate::new(40.4168, -3.7038).unwrap(),
            dropoff: Coordinate::new(40.4168, -3.6038).unwrap(),
            pickup_label: "Gran Via 1".to_string(),
            dropoff_label: "Atocha 10".to_string(),
            item_description: "Groceries".to_string(),
            customer_email: "ana@example.com".to_string(),
        };
        let distance = request.pickup.distance_km(&request.dropoff);
        let quote = PricingSchedule::default().quote(distance).unwrap();
        DeliveryOrder::new(request, quote).unwrap()
    }

    fn test_strategy(base_url: &str) -> StripeCheckoutStrategy {
        let config = StripeConfig::new("sk_test_abc123", None).with_api_base_url(base_url);
        StripeCheckoutStrategy::new(config).unwrap()
    }

    fn empty_customer_list() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "object": "list",
            "data": []
        }))
    }

    fn session_response(id: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": id,
            "url": format!("https://checkout.stripe.com/c/pay/{}", id),
            "expires_at": 4102444800i64
        }))
    }

    #[tokio::test]
    async fn test_customer_lookup_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .and(query_param("email", "ana@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{"id": "cus_123", "email": "ana@example.com"}]
            })))
            .mount(&server)
            .await;

        let strategy = test_strategy(&server.uri());
        let customer = strategy
            .find_customer_by_email("ana@example.com")
            .await
            .unwrap();

        assert_eq!(customer.as_deref(), Some("cus_123"));
    }

    #[tokio::test]
    async fn test_checkout_attaches_existing_customer() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{"id": "cus_123"}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(body_string_contains("mode=payment"))
            .and(body_string_contains("customer=cus_123"))
            .respond_with(session_response("cs_test_1"))
            .expect(1)
            .mount(&server)
            .await;

        let strategy = test_strategy(&server.uri());
        let session = strategy
            .create_checkout(&test_order(), "http://app/success", "http://app/cancel")
            .await
            .unwrap();

        assert_eq!(session.session_id, "cs_test_1");
        assert_eq!(session.customer_id.as_deref(), Some("cus_123"));
        assert!(session.redirect_url.contains("cs_test_1"));
    }

    #[tokio::test]
    async fn test_checkout_falls_back_to_customer_email() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .respond_with(empty_customer_list())
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(body_string_contains("customer_email=ana"))
            .respond_with(session_response("cs_test_2"))
            .expect(1)
            .mount(&server)
            .await;

        let strategy = test_strategy(&server.uri());
        let session = strategy
            .create_checkout(&test_order(), "http://app/success", "http://app/cancel")
            .await
            .unwrap();

        assert_eq!(session.session_id, "cs_test_2");
        assert!(session.customer_id.is_none());
    }

    #[tokio::test]
    async fn test_checkout_sends_quoted_amount_and_metadata() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .respond_with(empty_customer_list())
            .mount(&server)
            .await;

        let order = test_order();
        let amount = order.quote.total_minor_units().to_string();

        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            // Form keys are percent-encoded, so match on suffix + value
            .and(body_string_contains(format!("unit_amount%5D={}", amount)))
            .and(body_string_contains("Courier+Delivery+Service"))
            .and(body_string_contains("distance_km"))
            .respond_with(session_response("cs_test_3"))
            .expect(1)
            .mount(&server)
            .await;

        let strategy = test_strategy(&server.uri());
        let session = strategy
            .create_checkout(&order, "http://app/success", "http://app/cancel")
            .await
            .unwrap();

        assert_eq!(session.quote, order.quote);
        assert_eq!(session.metadata.get("delivery_id"), Some(&order.id));
    }

    #[tokio::test]
    async fn test_provider_error_propagates_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .respond_with(empty_customer_list())
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Invalid currency: xyz", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let strategy = test_strategy(&server.uri());
        let err = strategy
            .create_checkout(&test_order(), "http://app/success", "http://app/cancel")
            .await
            .unwrap_err();

        match err {
            CourierError::Provider { provider, message } => {
                assert_eq!(provider, "stripe");
                assert_eq!(message, "Invalid currency: xyz");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider_maps_to_server_error() {
        // Nothing listens on port 1; the connection fails before any
        // provider response exists
        let strategy = test_strategy("http://127.0.0.1:1");

        let err = strategy
            .create_checkout(&test_order(), "http://app/success", "http://app/cancel")
            .await
            .unwrap_err();

        assert!(matches!(err, CourierError::Network(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_sequential_requests_yield_distinct_sessions() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .respond_with(empty_customer_list())
            .mount(&server)
            .await;

        // No idempotency key: the provider mints a fresh session each time
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(session_response("cs_test_a"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(session_response("cs_test_b"))
            .mount(&server)
            .await;

        let strategy = test_strategy(&server.uri());
        let order = test_order();

        let first = strategy
            .create_checkout(&order, "http://app/success", "http://app/cancel")
            .await
            .unwrap();
        let second = strategy
            .create_checkout(&order, "http://app/success", "http://app/cancel")
            .await
            .unwrap();

        assert_ne!(first.redirect_url, second.redirect_url);
    }
}
