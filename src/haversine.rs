//! Haversine trip estimator (fallback when no routing service is configured).
//!
//! Orders stops nearest-neighbour (from the first waypoint when it is fixed)
//! and prices the straight lines between them at an assumed speed.
//! Less accurate than a road router but always available.

use serde_json::json;

use crate::error::ServiceError;
use crate::geo::{GeoPoint, distance_meters};
use crate::polyline::Polyline;
use crate::traits::{Trip, TripOptimizer};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct HaversineTrips {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineTrips {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineTrips {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    fn meters_to_seconds(&self, meters: f64) -> f64 {
        let hours = meters / 1000.0 / self.speed_kmh;
        (hours * 3600.0).round()
    }

    /// Greedy nearest-neighbour visiting order from `first`. With `fix_last`
    /// the final waypoint is held back until the end.
    fn visit_order_from(waypoints: &[GeoPoint], first: usize, fix_last: bool) -> Vec<usize> {
        let n = waypoints.len();
        let last = (fix_last && n > 1).then_some(n - 1);

        let mut remaining: Vec<usize> = (0..n).filter(|&i| i != first && Some(i) != last).collect();
        let mut order = vec![first];
        let mut current = first;
        while !remaining.is_empty() {
            let (position, _) = remaining
                .iter()
                .enumerate()
                .map(|(position, &index)| (position, distance_meters(waypoints[current], waypoints[index])))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, 0.0));
            current = remaining.remove(position);
            order.push(current);
        }
        order.extend(last);
        order
    }

    /// Starts at waypoint 0 when `fix_first`, otherwise from whichever
    /// waypoint gives the shortest greedy tour.
    fn visit_order(waypoints: &[GeoPoint], fix_first: bool, fix_last: bool) -> Vec<usize> {
        let n = waypoints.len();
        if fix_first {
            return Self::visit_order_from(waypoints, 0, fix_last);
        }

        let free_end = if fix_last { n - 1 } else { n };
        (0..free_end.max(1))
            .map(|first| Self::visit_order_from(waypoints, first, fix_last))
            .map(|order| (path_length(waypoints, &order), order))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, order)| order)
            .unwrap_or_else(|| (0..n).collect())
    }
}

fn path_length(waypoints: &[GeoPoint], order: &[usize]) -> f64 {
    order
        .windows(2)
        .map(|pair| distance_meters(waypoints[pair[0]], waypoints[pair[1]]))
        .sum()
}

impl TripOptimizer for HaversineTrips {
    fn optimize_trip(
        &self,
        waypoints: &[GeoPoint],
        fix_first: bool,
        fix_last: bool,
    ) -> Result<Option<Trip>, ServiceError> {
        if waypoints.len() < 2 {
            return Ok(None);
        }

        let visit_order = Self::visit_order(waypoints, fix_first, fix_last);
        let mut legs = Vec::with_capacity(visit_order.len() - 1);
        let mut distance = 0.0;
        let mut duration = 0.0;
        for pair in visit_order.windows(2) {
            let meters = distance_meters(waypoints[pair[0]], waypoints[pair[1]]);
            let seconds = self.meters_to_seconds(meters);
            distance += meters;
            duration += seconds;
            legs.push(json!({ "distance": meters, "duration": seconds, "summary": "straight line" }));
        }

        let geometry = Polyline::new(visit_order.iter().map(|&i| waypoints[i]).collect());

        Ok(Some(Trip {
            distance,
            duration,
            visit_order,
            legs: serde_json::Value::Array(legs),
            geometry,
        }))
    }
}
