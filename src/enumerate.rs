//! Route enumeration over every combination of per-task candidates.
//!
//! One trip request is issued per element of the Cartesian product, so the
//! number of provider calls is the product of the candidate list lengths.
//! The per-task cap applied upstream is what keeps this small.

use rayon::prelude::*;

use crate::events::{EventSink, PipelineEvent};
use crate::model::{ResolvedLocation, RouteOption, Task};
use crate::scoring::score;
use crate::traits::{Trip, TripOptimizer};

/// Every way of picking one element per list. The first list varies slowest.
///
/// No lists, or any empty list, yields no combinations.
pub fn cartesian_product<T>(lists: &[Vec<T>]) -> Vec<Vec<&T>> {
    if lists.is_empty() || lists.iter().any(Vec::is_empty) {
        return Vec::new();
    }

    let mut combinations: Vec<Vec<&T>> = vec![Vec::with_capacity(lists.len())];
    for list in lists {
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                list.iter().map(move |item| {
                    let mut combination = prefix.clone();
                    combination.push(item);
                    combination
                })
            })
            .collect();
    }
    combinations
}

pub struct RouteEnumerator<'a, T, E> {
    trips: &'a T,
    events: &'a E,
    parallel: bool,
}

impl<'a, T, E> RouteEnumerator<'a, T, E>
where
    T: TripOptimizer + Sync,
    E: EventSink + Sync,
{
    pub fn new(trips: &'a T, events: &'a E, parallel: bool) -> Self {
        Self {
            trips,
            events,
            parallel,
        }
    }

    /// Prices every combination of `candidates` (one list per task, in task
    /// order) as a trip from `start`. Combinations the provider cannot route
    /// are skipped.
    pub fn enumerate(
        &self,
        start: &ResolvedLocation,
        tasks: &[Task],
        candidates: &[Vec<ResolvedLocation>],
    ) -> Vec<RouteOption> {
        let combinations = cartesian_product(candidates);

        let outcomes: Vec<Result<Trip, String>> = if self.parallel {
            combinations
                .par_iter()
                .map(|combination| self.request_trip(start, combination))
                .collect()
        } else {
            combinations
                .iter()
                .map(|combination| self.request_trip(start, combination))
                .collect()
        };

        let mut options = Vec::new();
        for (combination, outcome) in combinations.iter().zip(outcomes) {
            let names = stop_names(combination);
            match outcome {
                Ok(trip) => {
                    let route_id = format!("route-{}", options.len() + 1);
                    self.events.emit(PipelineEvent::CombinationEnumerated {
                        route_id: route_id.clone(),
                        stops: names,
                        duration: trip.duration,
                    });
                    options.push(build_option(route_id, tasks, combination, trip));
                }
                Err(reason) => self.events.emit(PipelineEvent::CombinationSkipped {
                    stops: names,
                    reason,
                }),
            }
        }
        options
    }

    fn request_trip(&self, start: &ResolvedLocation, combination: &[&ResolvedLocation]) -> Result<Trip, String> {
        let waypoints: Vec<_> = std::iter::once(start.coordinates)
            .chain(combination.iter().map(|location| location.coordinates))
            .collect();

        match self.trips.optimize_trip(&waypoints, true, false) {
            Ok(Some(trip)) => Ok(trip),
            Ok(None) => Err("no trip found".to_string()),
            Err(err) => Err(err.to_string()),
        }
    }
}

fn build_option(id: String, tasks: &[Task], combination: &[&ResolvedLocation], trip: Trip) -> RouteOption {
    let preference_score = score(tasks.iter().zip(combination.iter().copied()));

    RouteOption {
        id,
        stops: visiting_order(combination, &trip.visit_order),
        total_distance: trip.distance,
        total_duration: trip.duration,
        legs: trip.legs,
        geometry: trip.geometry,
        preference_score,
    }
}

/// Stops in trip order. `visit_order` indexes the waypoints, where 0 is the
/// start; an order that is not a permutation of the waypoints is ignored.
fn visiting_order(combination: &[&ResolvedLocation], visit_order: &[usize]) -> Vec<ResolvedLocation> {
    let waypoint_count = combination.len() + 1;
    let mut seen = vec![false; waypoint_count];
    let is_permutation = visit_order.len() == waypoint_count
        && visit_order.iter().all(|&index| {
            index < waypoint_count && !std::mem::replace(&mut seen[index], true)
        });

    if !is_permutation {
        return combination.iter().map(|&location| location.clone()).collect();
    }

    visit_order
        .iter()
        .filter(|&&index| index > 0)
        .map(|&index| combination[index - 1].clone())
        .collect()
}

fn stop_names(combination: &[&ResolvedLocation]) -> Vec<String> {
    combination.iter().map(|location| location.name.clone()).collect()
}
