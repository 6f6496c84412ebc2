//! Final ordering of route options.

use std::cmp::Ordering;

use crate::model::RouteOption;

/// Route options returned to the caller.
pub const DEFAULT_ROUTE_LIMIT: usize = 5;

/// Fastest first; equal durations prefer the higher preference score.
/// Keeps at most `limit` options.
pub fn rank(mut options: Vec<RouteOption>, limit: usize) -> Vec<RouteOption> {
    options.sort_by(compare);
    options.truncate(limit);
    options
}

fn compare(a: &RouteOption, b: &RouteOption) -> Ordering {
    a.total_duration
        .total_cmp(&b.total_duration)
        .then_with(|| b.preference_score.cmp(&a.preference_score))
}
