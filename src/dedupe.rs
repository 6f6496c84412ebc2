//! Near-duplicate collapsing of geocoded places.

use crate::model::ResolvedLocation;

/// Separation under which two suggestions are treated as the same place.
pub const DEFAULT_MIN_SEPARATION_M: f64 = 100.0;

/// Greedy pass keeping the first-seen member of every near-duplicate cluster.
///
/// A location is dropped when it lies strictly closer than
/// `min_separation_meters` to an already accepted one.
pub fn dedupe(locations: Vec<ResolvedLocation>, min_separation_meters: f64) -> Vec<ResolvedLocation> {
    let mut unique: Vec<ResolvedLocation> = Vec::with_capacity(locations.len());
    for location in locations {
        let is_duplicate = unique.iter().any(|accepted| {
            accepted.coordinates.distance_to(&location.coordinates) < min_separation_meters
        });
        if !is_duplicate {
            unique.push(location);
        }
    }
    unique
}
