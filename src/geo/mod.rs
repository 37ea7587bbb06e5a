//! Geodesic math over geographic coordinates
//!
//! ## Responsibilities
//!
//! - `Coordinate` value type with range validation
//! - Great-circle distance (haversine)
//! - Radius membership predicate
//!
//! Pure computation throughout; the nearest-site ranking built on top of it
//! lives in [`search`].

pub mod search;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated geographic point (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(Error::Validation(
                "coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::Validation(format!(
                "latitude {} out of range [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::Validation(format!(
                "longitude {} out of range [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Haversine distance between two points (km)
///
/// Standard haversine precision (no ellipsoidal correction).
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Whether `b` lies within `radius_km` of `a`
pub fn within_radius(a: Coordinate, b: Coordinate, radius_km: f64) -> bool {
    distance_km(a, b) <= radius_km
}
