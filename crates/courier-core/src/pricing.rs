//! # Delivery Pricing
//!
//! Fixed-schedule pricing: a flat base fee plus a per-kilometer rate over
//! the straight-line distance. The schedule defined here is the single
//! source of truth for courier pricing; clients fetch it rather than
//! hardcoding their own copies.

use crate::error::{CourierError, CourierResult};
use serde::{Deserialize, Serialize};

/// Canonical base fee charged on every delivery
pub const BASE_FEE: f64 = 6.50;

/// Canonical rate charged per kilometer of straight-line distance
pub const PER_KM_RATE: f64 = 0.50;

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    EUR,
    USD,
    GBP,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::EUR => "eur",
            Currency::USD => "usd",
            Currency::GBP => "gbp",
        }
    }

    /// Number of decimal places (all supported currencies use 2)
    pub fn decimal_places(&self) -> u8 {
        2
    }

    /// Convert a decimal amount to the smallest currency unit (cents)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// The pricing schedule applied to deliveries
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSchedule {
    /// Flat fee charged on every delivery
    pub base_fee: f64,
    /// Fee per kilometer of distance
    pub per_km_rate: f64,
    /// Settlement currency
    pub currency: Currency,
}

impl PricingSchedule {
    /// Price a delivery over the given distance.
    ///
    /// Rejects negative or non-finite distances. The returned quote keeps
    /// full floating precision; rounding happens only at minor-unit
    /// conversion for the provider.
    pub fn quote(&self, distance_km: f64) -> CourierResult<Quote> {
        if !distance_km.is_finite() {
            return Err(CourierError::InvalidInput(
                "Distance must be numeric".to_string(),
            ));
        }
        if distance_km < 0.0 {
            return Err(CourierError::InvalidInput(format!(
                "Distance cannot be negative: {}",
                distance_km
            )));
        }

        let distance_fee = distance_km * self.per_km_rate;
        Ok(Quote {
            distance_km,
            base_fee: self.base_fee,
            distance_fee,
            total_price: self.base_fee + distance_fee,
            currency: self.currency,
        })
    }
}

impl Default for PricingSchedule {
    fn default() -> Self {
        Self {
            base_fee: BASE_FEE,
            per_km_rate: PER_KM_RATE,
            currency: Currency::EUR,
        }
    }
}

/// A priced delivery. Derived, immutable once computed, not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Straight-line distance in kilometers
    pub distance_km: f64,
    /// Flat fee component
    pub base_fee: f64,
    /// Distance-proportional fee component
    pub distance_fee: f64,
    /// Sum of base and distance fees
    pub total_price: f64,
    /// Settlement currency
    pub currency: Currency,
}

impl Quote {
    /// Total in the currency's smallest unit, rounded to the nearest cent.
    ///
    /// This is the only point where monetary rounding happens.
    pub fn total_minor_units(&self) -> i64 {
        self.currency.to_smallest_unit(self.total_price)
    }

    /// Two-decimal distance for display and provider metadata
    pub fn display_distance(&self) -> String {
        format!("{:.2}", self.distance_km)
    }

    /// Two-decimal total for display
    pub fn display_total(&self) -> String {
        format!("{:.2}", self.total_price)
    }
}
