//! # Geographic Coordinates
//!
//! Coordinate validation and great-circle distance estimation.
//! Distances are straight-line Haversine estimates, not road distances.

use crate::error::{CourierError, CourierResult};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic coordinate in decimal degrees
///
/// Deserialization goes through [`Coordinate::new`], so a decoded value is
/// always range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    /// Latitude in [-90, 90]
    pub lat: f64,
    /// Longitude in [-180, 180]
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CourierError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    /// Create a validated coordinate.
    ///
    /// Rejects non-finite values and out-of-range latitude/longitude.
    pub fn new(lat: f64, lng: f64) -> CourierResult<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CourierError::InvalidInput(
                "Coordinates must be numeric".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CourierError::InvalidInput(format!(
                "Latitude out of range: {}",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CourierError::InvalidInput(format!(
                "Longitude out of range: {}",
                lng
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Great-circle distance to another coordinate in kilometers.
    ///
    /// Haversine formula with mean Earth radius 6371 km. Identical points
    /// yield exactly 0.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(*self, *other)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lng)
    }
}

/// Haversine distance between two coordinates in kilometers
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    // Clamp guards against rounding pushing h past 1 for near-antipodal pairs
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}
