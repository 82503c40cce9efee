//! # Stripe Webhook Handling
//!
//! Signature verification and event parsing for payment notifications.
//! The courier flow only listens: completed checkouts, payment outcomes,
//! and refunds are logged and handed to a `WebhookHandler`; order
//! persistence lives outside this service.

use courier_core::{CourierError, CourierResult, WebhookEvent, WebhookEventType};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Timestamp tolerance for replayed signatures
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify a Stripe signature header and parse the event payload.
///
/// The header carries a timestamp and one or more `v1` HMAC-SHA256
/// signatures over `"{timestamp}.{payload}"`.
pub fn verify_and_parse(
    secret: &str,
    payload: &[u8],
    signature: &str,
) -> CourierResult<WebhookEvent> {
    let header = parse_signature_header(signature)?;

    let now = chrono::Utc::now().timestamp();
    if (now - header.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(CourierError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let signed_payload = format!("{}.{}", header.timestamp, String::from_utf8_lossy(payload));
    let expected = compute_hmac_sha256(secret, &signed_payload);

    let valid = header
        .signatures
        .iter()
        .any(|sig| constant_time_eq(sig, &expected));

    if !valid {
        return Err(CourierError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    let event: StripeWebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| CourierError::WebhookParse(format!("Failed to parse webhook: {}", e)))?;

    debug!("Verified Stripe webhook: type={}", event.event_type);

    let event_type = match event.event_type.as_str() {
        "checkout.session.completed" => WebhookEventType::CheckoutCompleted,
        "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
        "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
        "charge.refunded" => WebhookEventType::RefundIssued,
        other => WebhookEventType::Unknown(other.to_string()),
    };

    let object = &event.data.object;
    let session_id = object.get("id").and_then(|v| v.as_str()).map(String::from);
    let payment_intent_id = object
        .get("payment_intent")
        .and_then(|v| v.as_str())
        .map(String::from);
    let customer_email = object
        .get("customer_details")
        .and_then(|cd| cd.get("email"))
        .and_then(|v| v.as_str())
        .map(String::from);
    let amount_paid = object.get("amount_total").and_then(|v| v.as_i64());

    Ok(WebhookEvent {
        event_id: event.id,
        event_type,
        provider: "stripe".to_string(),
        session_id,
        payment_intent_id,
        customer_email,
        amount_paid,
        raw_data: Some(serde_json::Value::Object(event.data.object)),
        timestamp: chrono::DateTime::from_timestamp(event.created, 0)
            .unwrap_or_else(chrono::Utc::now),
    })
}

/// Parsed checkout.session.completed event data
#[derive(Debug, Clone)]
pub struct CheckoutCompletedData {
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_email: Option<String>,
    pub amount_total: i64,
    pub payment_status: String,
    pub metadata: HashMap<String, String>,
}

impl CheckoutCompletedData {
    /// Parse from a verified webhook event
    pub fn from_event(event: &WebhookEvent) -> CourierResult<Self> {
        let raw = event
            .raw_data
            .as_ref()
            .ok_or_else(|| CourierError::WebhookParse("Missing raw data".to_string()))?;

        let obj = raw
            .as_object()
            .ok_or_else(|| CourierError::WebhookParse("Raw data is not an object".to_string()))?;

        let session_id = obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| CourierError::WebhookParse("Missing session id".to_string()))?;

        let metadata = obj
            .get("metadata")
            .and_then(|m| m.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            session_id,
            payment_intent_id: obj
                .get("payment_intent")
                .and_then(|v| v.as_str())
                .map(String::from),
            customer_id: obj
                .get("customer")
                .and_then(|v| v.as_str())
                .map(String::from),
            customer_email: obj
                .get("customer_details")
                .and_then(|cd| cd.get("email"))
                .and_then(|v| v.as_str())
                .map(String::from),
            amount_total: obj
                .get("amount_total")
                .and_then(|v| v.as_i64())
                .unwrap_or(0),
            payment_status: obj
                .get("payment_status")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            metadata,
        })
    }

    /// Check if payment was successful
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// The delivery id threaded through session metadata
    pub fn delivery_id(&self) -> Option<&str> {
        self.metadata.get("delivery_id").map(|s| s.as_str())
    }
}

/// Webhook event handler trait
///
/// Implement this trait to react to payment events. Default methods log.
#[allow(unused_variables)]
pub trait WebhookHandler: Send + Sync {
    /// Called when a checkout session is completed
    fn on_checkout_completed(&self, data: CheckoutCompletedData) -> CourierResult<()> {
        info!(
            "Checkout completed: session={}, delivery={:?}, amount={}",
            data.session_id,
            data.delivery_id(),
            data.amount_total
        );
        Ok(())
    }

    /// Called when a payment succeeds
    fn on_payment_succeeded(&self, event: &WebhookEvent) -> CourierResult<()> {
        info!("Payment succeeded: {:?}", event.payment_intent_id);
        Ok(())
    }

    /// Called when a payment fails
    fn on_payment_failed(&self, event: &WebhookEvent) -> CourierResult<()> {
        warn!("Payment failed: {:?}", event.payment_intent_id);
        Ok(())
    }

    /// Called when a refund is issued
    fn on_refund_issued(&self, event: &WebhookEvent) -> CourierResult<()> {
        info!("Refund issued: {:?}", event.payment_intent_id);
        Ok(())
    }

    /// Called for unknown/unhandled events
    fn on_unknown_event(&self, event: &WebhookEvent) -> CourierResult<()> {
        debug!("Unhandled webhook event: {:?}", event.event_type);
        Ok(())
    }
}

/// Default no-op webhook handler (just logs events)
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a webhook event to the appropriate handler method
pub fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: WebhookEvent,
) -> CourierResult<()> {
    match &event.event_type {
        WebhookEventType::CheckoutCompleted => {
            let data = CheckoutCompletedData::from_event(&event)?;
            handler.on_checkout_completed(data)
        }
        WebhookEventType::PaymentSucceeded => handler.on_payment_succeeded(&event),
        WebhookEventType::PaymentFailed => handler.on_payment_failed(&event),
        WebhookEventType::RefundIssued => handler.on_refund_issued(&event),
        WebhookEventType::Unknown(_) => handler.on_unknown_event(&event),
    }
}

// =============================================================================
// Stripe Event Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

// =============================================================================
// Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> CourierResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        CourierError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(CourierError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &str, timestamp: i64) -> String {
        let sig = compute_hmac_sha256(SECRET, &format!("{}.{}", timestamp, payload));
        format!("t={},v1={}", timestamp, sig)
    }

    fn completed_payload() -> String {
        json!({
            "id": "evt_test_1",
            "type": "checkout.session.completed",
            "created": Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "payment_intent": "pi_test_456",
                    "customer": "cus_test_789",
                    "customer_details": {"email": "ana@example.com"},
                    "amount_total": 1073,
                    "currency": "eur",
                    "payment_status": "paid",
                    "metadata": {
                        "delivery_id": "dlv_abc",
                        "distance_km": "8.47"
                    }
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_signature_header() {
        let header = "t=1234567890,v1=abc123,v1=def456";
        let parsed = parse_signature_header(header).unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures.len(), 2);
        assert_eq!(parsed.signatures[0], "abc123");

        assert!(parse_signature_header("v1=abc").is_err());
        assert!(parse_signature_header("t=123").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc123", "abc123"));
        assert!(!constant_time_eq("abc123", "abc124"));
        assert!(!constant_time_eq("abc", "abcd"));
    }

    #[test]
    fn test_verify_and_parse_valid_signature() {
        let payload = completed_payload();
        let header = sign(&payload, Utc::now().timestamp());

        let event = verify_and_parse(SECRET, payload.as_bytes(), &header).unwrap();

        assert_eq!(event.event_type, WebhookEventType::CheckoutCompleted);
        assert_eq!(event.session_id.as_deref(), Some("cs_test_123"));
        assert_eq!(event.amount_paid, Some(1073));
    }

    #[test]
    fn test_verify_rejects_bad_signature() {
        let payload = completed_payload();
        let header = format!("t={},v1=deadbeef", Utc::now().timestamp());

        let err = verify_and_parse(SECRET, payload.as_bytes(), &header).unwrap_err();
        assert!(matches!(err, CourierError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_verify_rejects_stale_timestamp() {
        let payload = completed_payload();
        let stale = Utc::now().timestamp() - 3600;
        let header = sign(&payload, stale);

        let err = verify_and_parse(SECRET, payload.as_bytes(), &header).unwrap_err();
        assert!(matches!(err, CourierError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_checkout_completed_data() {
        let payload = completed_payload();
        let header = sign(&payload, Utc::now().timestamp());
        let event = verify_and_parse(SECRET, payload.as_bytes(), &header).unwrap();

        let data = CheckoutCompletedData::from_event(&event).unwrap();

        assert_eq!(data.session_id, "cs_test_123");
        assert_eq!(data.payment_intent_id.as_deref(), Some("pi_test_456"));
        assert_eq!(data.customer_email.as_deref(), Some("ana@example.com"));
        assert_eq!(data.amount_total, 1073);
        assert!(data.is_paid());
        assert_eq!(data.delivery_id(), Some("dlv_abc"));
    }

    #[test]
    fn test_dispatch_webhook() {
        struct TestHandler {
            called: std::sync::atomic::AtomicBool,
        }

        impl WebhookHandler for TestHandler {
            fn on_checkout_completed(&self, _data: CheckoutCompletedData) -> CourierResult<()> {
                self.called.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }
        }

        let handler = TestHandler {
            called: std::sync::atomic::AtomicBool::new(false),
        };

        let payload = completed_payload();
        let header = sign(&payload, Utc::now().timestamp());
        let event = verify_and_parse(SECRET, payload.as_bytes(), &header).unwrap();

        dispatch_webhook_event(&handler, event).unwrap();
        assert!(handler.called.load(std::sync::atomic::Ordering::SeqCst));
    }
}
