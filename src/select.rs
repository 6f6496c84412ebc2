//! Nearest-first pruning of per-task candidates before enumeration.

use crate::geo::GeoPoint;
use crate::model::ResolvedLocation;

/// Candidates kept per task. The enumerator issues one trip request per
/// element of the Cartesian product, so this bounds the fan-out.
pub const DEFAULT_CLOSEST_PER_TASK: usize = 2;

/// Returns the `k` locations closest to `start`, nearest first. Ties keep
/// their input order.
pub fn select_closest(locations: &[ResolvedLocation], start: GeoPoint, k: usize) -> Vec<ResolvedLocation> {
    let mut by_distance: Vec<(f64, &ResolvedLocation)> = locations
        .iter()
        .map(|location| (start.distance_to(&location.coordinates), location))
        .collect();
    by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));

    by_distance
        .into_iter()
        .take(k)
        .map(|(_, location)| location.clone())
        .collect()
}
