//! OSRM HTTP adapter for trip optimization.
//!
//! Mapbox's Optimization API answers in the same shape as OSRM's `/trip`
//! service, so the response decoding here is shared with [`crate::mapbox`].

use serde::Deserialize;

use crate::chat::truncate;
use crate::error::ServiceError;
use crate::geo::{GeoPoint, distance_meters};
use crate::polyline::Polyline;
use crate::traits::{Trip, TripOptimizer};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl TripOptimizer for OsrmClient {
    fn optimize_trip(
        &self,
        waypoints: &[GeoPoint],
        fix_first: bool,
        fix_last: bool,
    ) -> Result<Option<Trip>, ServiceError> {
        if waypoints.len() < 2 {
            return Ok(None);
        }

        let url = format!(
            "{}/trip/v1/{}/{}",
            self.config.base_url,
            self.config.profile,
            coordinates_path(waypoints)
        );

        let response = self
            .client
            .get(url)
            .query(&trip_query(fix_first, fix_last))
            .send()?;

        read_trip_response(response, waypoints, needs_round_trip(fix_first, fix_last))
    }
}

/// `lng,lat;lng,lat;...` as both OSRM and Mapbox expect.
pub(crate) fn coordinates_path(waypoints: &[GeoPoint]) -> String {
    waypoints
        .iter()
        .map(|point| format!("{:.6},{:.6}", point.longitude, point.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

/// One-way trips are only served with both ends fixed. Anything looser is
/// requested as a round trip whose closing leg is cut off on decoding.
pub(crate) fn needs_round_trip(fix_first: bool, fix_last: bool) -> bool {
    !(fix_first && fix_last)
}

pub(crate) fn trip_query(fix_first: bool, fix_last: bool) -> Vec<(&'static str, &'static str)> {
    let roundtrip = needs_round_trip(fix_first, fix_last);
    vec![
        ("source", if fix_first { "first" } else { "any" }),
        ("destination", if fix_last { "last" } else { "any" }),
        ("roundtrip", if roundtrip { "true" } else { "false" }),
        ("geometries", "geojson"),
        ("overview", "full"),
        ("steps", "true"),
    ]
}

pub(crate) fn read_trip_response(
    response: reqwest::blocking::Response,
    waypoints: &[GeoPoint],
    round_trip: bool,
) -> Result<Option<Trip>, ServiceError> {
    let status = response.status();
    let body = response.text()?;
    interpret_trip_response(status, &body, waypoints, round_trip)
}

pub(crate) fn interpret_trip_response(
    status: reqwest::StatusCode,
    body: &str,
    waypoints: &[GeoPoint],
    round_trip: bool,
) -> Result<Option<Trip>, ServiceError> {
    match serde_json::from_str::<TripResponse>(body) {
        Ok(decoded) if status.is_success() || decoded.is_no_trip() => decode_trip(decoded, waypoints, round_trip),
        Err(err) if status.is_success() => Err(err.into()),
        _ => Err(ServiceError::Status {
            status: status.as_u16(),
            body: truncate(body, 200),
        }),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TripResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    trips: Vec<TripBody>,
    #[serde(default)]
    waypoints: Vec<TripWaypoint>,
}

impl TripResponse {
    fn is_no_trip(&self) -> bool {
        matches!(self.code.as_str(), "NoTrips" | "NoSegment" | "NoRoute")
    }
}

#[derive(Debug, Deserialize)]
struct TripBody {
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: serde_json::Value,
    #[serde(default)]
    geometry: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TripWaypoint {
    waypoint_index: usize,
    #[serde(default)]
    trips_index: usize,
    /// Snapped `[lng, lat]`.
    #[serde(default)]
    location: Option<[f64; 2]>,
}

/// Turns a decoded trip response into the first trip, if any. A round trip
/// loses its closing leg so the trip ends at its last stop.
pub(crate) fn decode_trip(
    response: TripResponse,
    waypoints: &[GeoPoint],
    round_trip: bool,
) -> Result<Option<Trip>, ServiceError> {
    if response.is_no_trip() {
        return Ok(None);
    }
    if response.code != "Ok" {
        return Err(ServiceError::Malformed(format!(
            "trip service returned {}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let Some(body) = response.trips.into_iter().next() else {
        return Ok(None);
    };

    // Waypoints come back in input order, each knowing its position on the trip.
    let waypoint_count = waypoints.len();
    let mut visit_order = vec![usize::MAX; waypoint_count];
    for (input_index, waypoint) in response.waypoints.iter().enumerate() {
        if waypoint.trips_index != 0 {
            continue;
        }
        if let Some(slot) = visit_order.get_mut(waypoint.waypoint_index) {
            *slot = input_index;
        }
    }
    if visit_order.contains(&usize::MAX) {
        visit_order = (0..waypoint_count).collect();
    }

    let mut trip = Trip {
        distance: body.distance,
        duration: body.duration,
        visit_order,
        legs: body.legs,
        geometry: Polyline::from_geojson(&body.geometry).unwrap_or_default(),
    };

    if round_trip {
        let last_stop = trip.visit_order.last().and_then(|&index| {
            response
                .waypoints
                .get(index)
                .and_then(|waypoint| waypoint.location)
                .map(GeoPoint::from_lng_lat)
                .or_else(|| waypoints.get(index).copied())
        });
        strip_closing_leg(&mut trip, last_stop);
    }

    Ok(Some(trip))
}

fn strip_closing_leg(trip: &mut Trip, last_stop: Option<GeoPoint>) {
    let Some(legs) = trip.legs.as_array_mut() else {
        return;
    };
    // A closed tour over n waypoints has n legs.
    if legs.len() < trip.visit_order.len() {
        return;
    }
    if let Some(closing) = legs.pop() {
        let field = |name: &str| closing.get(name).and_then(serde_json::Value::as_f64).unwrap_or(0.0);
        trip.distance = (trip.distance - field("distance")).max(0.0);
        trip.duration = (trip.duration - field("duration")).max(0.0);
    }

    let Some(last_stop) = last_stop else {
        return;
    };
    let cut = trip
        .geometry
        .points()
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, point)| {
            let distance = distance_meters(*point, last_stop);
            match best {
                Some((_, closest)) if closest < distance => best,
                _ => Some((index, distance)),
            }
        });
    if let Some((cut, _)) = cut {
        let kept = trip.geometry.points()[..=cut].to_vec();
        trip.geometry = Polyline::new(kept);
    }
}
