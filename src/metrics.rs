//! Figures and summaries derived from a priced route.

use serde::{Deserialize, Serialize};

use crate::model::RouteOption;

const METERS_TO_MILES: f64 = 0.000_621_371;
const GAS_COST_PER_MILE: f64 = 0.15;

/// Congestion guess from the average speed over the whole trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficFactor {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    pub traffic_factor: TrafficFactor,
    /// Dollars, rounded to cents.
    pub estimated_gas_cost: f64,
}

impl RouteMetrics {
    pub fn of(route: &RouteOption) -> Self {
        Self {
            traffic_factor: traffic_factor(route.total_distance, route.total_duration),
            estimated_gas_cost: gas_cost(route.total_distance),
        }
    }
}

pub fn traffic_factor(distance_m: f64, duration_s: f64) -> TrafficFactor {
    if duration_s <= 0.0 || !duration_s.is_finite() {
        return TrafficFactor::Medium;
    }

    let speed_kmh = distance_m / duration_s * 3.6;
    if speed_kmh < 20.0 {
        TrafficFactor::High
    } else if speed_kmh < 40.0 {
        TrafficFactor::Medium
    } else {
        TrafficFactor::Low
    }
}

pub fn gas_cost(distance_m: f64) -> f64 {
    let miles = distance_m * METERS_TO_MILES;
    (miles * GAS_COST_PER_MILE * 100.0).round() / 100.0
}

/// One-paragraph explanation of a route: time, distance, how well the
/// preferences are met and what traffic to expect.
pub fn reasoning(route: &RouteOption, metrics: &RouteMetrics) -> String {
    let minutes = (route.total_duration / 60.0).round();
    let km = route.total_distance / 1000.0;
    let mut text = format!("This route takes {minutes:.0} minutes and covers {km:.1}km. ");

    text.push_str(match route.preference_score {
        80.. => "Excellent preference match, all your requirements are satisfied.",
        60..=79 => "Good preference match, most of your requirements are met.",
        _ => "Fair preference match, some trade-offs were made for efficiency.",
    });

    match metrics.traffic_factor {
        TrafficFactor::High => text.push_str(" Note: high traffic expected on this route."),
        TrafficFactor::Low => text.push_str(" Light traffic conditions expected."),
        TrafficFactor::Medium => {}
    }
    text
}

/// Display label for the route at `index` (0 is best).
pub fn alternative_label(index: usize) -> String {
    match index {
        0 => "Best Overall".to_string(),
        1..=4 => format!("Alternative {index}"),
        _ => format!("Option {}", index + 1),
    }
}
