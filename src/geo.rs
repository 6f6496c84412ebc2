//! Geodesic helpers.
//!
//! Spherical haversine distances, good to about half a percent. That is
//! plenty for nearest-first ordering, near-duplicate detection and the
//! offline trip estimate.

use serde::{Deserialize, Serialize};

/// Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Providers that speak GeoJSON order coordinates as `[lng, lat]`.
    pub fn from_lng_lat(lng_lat: [f64; 2]) -> Self {
        Self::new(lng_lat[1], lng_lat[0])
    }

    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance_meters(*self, *other)
    }
}

/// Haversine great-circle distance in meters.
///
/// The intermediate term is clamped into `[0, 1]` so rounding near identical
/// or antipodal points never feeds a negative value into `sqrt`.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}
