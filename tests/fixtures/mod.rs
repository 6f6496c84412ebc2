//! Test fixtures for errand-planner.
//!
//! Deterministic stand-ins for the chat model, the geocoder and the trip
//! optimizer, plus a few real San Francisco Bay Area places.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use errand_planner::geo::{GeoPoint, distance_meters};
use errand_planner::polyline::Polyline;
use errand_planner::start::START_TASK_TYPE;
use errand_planner::traits::{
    ChatCompletion, ChatMessage, ChatReply, GeocodeQuery, GeocodeResult, Geocoder, Trip, TripOptimizer,
};
use errand_planner::{ResolvedLocation, ServiceError};

// ============================================================================
// Places
// ============================================================================

pub const UNION_SQUARE: (f64, f64) = (37.7880, -122.4075);

pub const WALMART_SF: (&str, f64, f64) = ("Walmart Supercenter, 1 Market St, San Francisco, CA 94105", 37.7940, -122.3950);
pub const SAFEWAY_SF: (&str, f64, f64) = ("Safeway, 2020 Market St, San Francisco, CA 94114", 37.7690, -122.4270);
pub const EQUINOX_SF: (&str, f64, f64) = ("Equinox, 301 Pine St, San Francisco, CA 94104", 37.7920, -122.4010);
pub const FITNESS_SF: (&str, f64, f64) = ("24 Hour Fitness, 1200 Van Ness Ave, San Francisco, CA 94109", 37.7870, -122.4210);
pub const CHASE_SF: (&str, f64, f64) = ("Chase Bank, 2 Stockton St, San Francisco, CA 94108", 37.7860, -122.4060);
pub const WELLS_SF: (&str, f64, f64) = ("Wells Fargo, 464 California St, San Francisco, CA 94104", 37.7930, -122.4020);

pub fn point((_, lat, lng): (&str, f64, f64)) -> GeoPoint {
    GeoPoint::new(lat, lng)
}

pub fn start() -> ResolvedLocation {
    ResolvedLocation::new(
        "Union Square",
        "San Francisco, CA",
        GeoPoint::new(UNION_SQUARE.0, UNION_SQUARE.1),
        START_TASK_TYPE,
    )
}

/// JSON array reply listing the given places.
pub fn suggestions(places: &[(&str, f64, f64)]) -> String {
    let names: Vec<&str> = places.iter().map(|(name, _, _)| *name).collect();
    serde_json::to_string(&names).unwrap()
}

// ============================================================================
// Chat
// ============================================================================

/// Answers with the reply of the first rule whose needle occurs in the last
/// message, or `[]`.
#[derive(Default)]
pub struct ScriptedChat {
    rules: Vec<(String, Result<String, ServiceError>)>,
    calls: AtomicUsize,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, needle: &str, content: impl Into<String>) -> Self {
        self.rules.push((needle.to_string(), Ok(content.into())));
        self
    }

    pub fn fail(mut self, needle: &str, error: ServiceError) -> Self {
        self.rules.push((needle.to_string(), Err(error)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatCompletion for ScriptedChat {
    fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        match self.rules.iter().find(|(needle, _)| last.contains(needle.as_str())) {
            Some((_, Ok(content))) => Ok(ChatReply {
                content: content.clone(),
            }),
            Some((_, Err(error))) => Err(error.clone()),
            None => Ok(ChatReply { content: "[]".into() }),
        }
    }
}

// ============================================================================
// Geocoder
// ============================================================================

/// Exact-text lookup table.
#[derive(Default)]
pub struct TableGeocoder {
    entries: Vec<(String, GeocodeResult)>,
    queries: Mutex<Vec<String>>,
}

impl TableGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, display_name: &str, short_name: &str, lat: f64, lng: f64) -> Self {
        self.entries.push((
            text.to_string(),
            GeocodeResult {
                coordinates: GeoPoint::new(lat, lng),
                display_name: display_name.to_string(),
                short_name: short_name.to_string(),
            },
        ));
        self
    }

    /// Registers a suggestion string under its own text.
    pub fn place(self, (text, lat, lng): (&str, f64, f64)) -> Self {
        let street = text.split(',').nth(1).unwrap_or_default().trim().to_string();
        self.with(text, text, &street, lat, lng)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Geocoder for TableGeocoder {
    fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>, ServiceError> {
        self.queries.lock().unwrap().push(query.text.clone());
        Ok(self
            .entries
            .iter()
            .filter(|(text, _)| *text == query.text)
            .map(|(_, result)| result.clone())
            .take(query.limit.max(1))
            .collect())
    }
}

// ============================================================================
// Trips
// ============================================================================

/// Visits waypoints in input order at 10 m/s. Fails any trip that touches
/// every point of a registered failure set.
#[derive(Default)]
pub struct StraightTrips {
    failures: Vec<Vec<GeoPoint>>,
    calls: AtomicUsize,
}

impl StraightTrips {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_with(mut self, points: &[GeoPoint]) -> Self {
        self.failures.push(points.to_vec());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TripOptimizer for StraightTrips {
    fn optimize_trip(
        &self,
        waypoints: &[GeoPoint],
        _fix_first: bool,
        _fix_last: bool,
    ) -> Result<Option<Trip>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let fails = self
            .failures
            .iter()
            .any(|set| set.iter().all(|point| waypoints.contains(point)));
        if fails {
            return Err(ServiceError::Status {
                status: 422,
                body: "NoSegment".into(),
            });
        }

        let distance: f64 = waypoints.windows(2).map(|w| distance_meters(w[0], w[1])).sum();
        Ok(Some(Trip {
            distance,
            duration: distance / 10.0,
            visit_order: (0..waypoints.len()).collect(),
            legs: serde_json::Value::Array(Vec::new()),
            geometry: Polyline::new(waypoints.to_vec()),
        }))
    }
}

/// Never finds a trip.
pub struct NoTrips;

impl TripOptimizer for NoTrips {
    fn optimize_trip(&self, _: &[GeoPoint], _: bool, _: bool) -> Result<Option<Trip>, ServiceError> {
        Ok(None)
    }
}
