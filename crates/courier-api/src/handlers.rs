//! # Request Handlers
//!
//! Axum request handlers for the courier pricing and checkout API.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use courier_core::{Coordinate, CourierError, DeliveryOrder, DeliveryRequest, Quote};
use courier_stripe::{dispatch_webhook_event, LoggingWebhookHandler};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout request, field names as sent by the web client
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub item_description: String,
    pub user_email: String,
    /// Optional: thread an idempotency key to the provider
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Create checkout response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    /// Checkout URL (redirect the customer here)
    pub url: String,
    /// Two-decimal distance in kilometers
    pub distance: String,
    /// Two-decimal total price
    pub total_price: String,
}

/// Quote preview request: coordinates only, no provider call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

fn error_to_response(err: CourierError) -> (StatusCode, Json<ErrorResponse>) {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(err.to_string())))
}

/// Price a coordinate pair against the canonical schedule
fn quote_for(state: &AppState, req: &QuoteRequest) -> Result<Quote, CourierError> {
    let pickup = Coordinate::new(req.pickup_lat, req.pickup_lng)?;
    let dropoff = Coordinate::new(req.dropoff_lat, req.dropoff_lng)?;
    state.pricing.quote(pickup.distance_km(&dropoff))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "courier-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// The canonical pricing schedule, for client-side price previews
pub async fn pricing(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pricing)
}

/// Compute a price quote without creating a checkout session
#[instrument(skip(state, request))]
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<Quote>, (StatusCode, Json<ErrorResponse>)> {
    quote_for(&state, &request)
        .map(Json)
        .map_err(error_to_response)
}

/// Price a delivery and open a hosted checkout session
#[instrument(skip(state, request), fields(pickup = %request.pickup_location, dropoff = %request.dropoff_location))]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    let pickup =
        Coordinate::new(request.pickup_lat, request.pickup_lng).map_err(error_to_response)?;
    let dropoff =
        Coordinate::new(request.dropoff_lat, request.dropoff_lng).map_err(error_to_response)?;

    let distance_km = pickup.distance_km(&dropoff);
    let quote = state
        .pricing
        .quote(distance_km)
        .map_err(error_to_response)?;

    let delivery = DeliveryRequest {
        pickup,
        dropoff,
        pickup_label: request.pickup_location,
        dropoff_label: request.dropoff_location,
        item_description: request.item_description,
        customer_email: request.user_email,
    };

    let mut order = DeliveryOrder::new(delivery, quote).map_err(error_to_response)?;
    if let Some(key) = request.idempotency_key {
        order = order.with_idempotency_key(key);
    }

    info!(
        "Creating checkout: delivery={}, distance={} km, total={} {}",
        order.id,
        quote.display_distance(),
        quote.display_total(),
        quote.currency
    );

    let session = state
        .strategy
        .create_checkout(&order, &state.success_url(), &state.cancel_url())
        .await
        .map_err(|e| {
            error!(
                "Failed to create checkout session: {} (distance={} km, total={})",
                e,
                quote.display_distance(),
                quote.display_total()
            );
            error_to_response(e)
        })?;

    info!("Created checkout session: {}", session.session_id);

    Ok(Json(CreateCheckoutResponse {
        url: session.redirect_url,
        distance: quote.display_distance(),
        total_price: quote.display_total(),
    }))
}

/// Handle Stripe webhook deliveries
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing Stripe-Signature header")),
            )
        })?;

    let event = state
        .strategy
        .verify_webhook(&body, signature)
        .await
        .map_err(|e| {
            error!("Webhook verification failed: {}", e);
            error_to_response(e)
        })?;

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.event_id
    );

    dispatch_webhook_event(&LoggingWebhookHandler, event).map_err(|e| {
        error!("Webhook handler error: {}", e);
        error_to_response(e)
    })?;

    Ok(StatusCode::OK)
}

/// Checkout success page
pub async fn checkout_success(
    axum::extract::Query(params): axum::extract::Query<
        std::collections::HashMap<String, String>,
    >,
) -> impl IntoResponse {
    let session_id = params
        .get("session_id")
        .map(|s| s.as_str())
        .unwrap_or("unknown");
    axum::response::Html(format!(
        r#"
<!DOCTYPE html>
<html>
<head><title>Payment Successful</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0;">
    <div style="padding: 60px; border-radius: 16px; text-align: center; border: 1px solid #ddd;">
        <h1>Payment Successful</h1>
        <p>Session: <code>{}</code></p>
        <p style="color: #666;">Your courier is on the way.</p>
    </div>
</body>
</html>
"#,
        session_id
    ))
}

/// Checkout cancel page
pub async fn checkout_cancel() -> impl IntoResponse {
    axum::response::Html(
        r#"
<!DOCTYPE html>
<html>
<head><title>Payment Cancelled</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0;">
    <div style="padding: 60px; border-radius: 16px; text-align: center; border: 1px solid #ddd;">
        <h1>Payment Cancelled</h1>
        <p style="color: #666;">No charges were made.</p>
    </div>
</body>
</html>
"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "boom"}));
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = error_to_response(CourierError::InvalidInput("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_to_response(CourierError::Provider {
            provider: "stripe".into(),
            message: "boom".into(),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
