//! Seams to the two external collaborators.
//!
//! The pipeline never talks HTTP itself: a chat-completion service suggests
//! places and parses intent, a mapping service geocodes and optimizes trips.
//! Tests swap in deterministic fakes.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::geo::GeoPoint;
use crate::polyline::Polyline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
}

/// A chat-completion language model.
pub trait ChatCompletion {
    fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, ServiceError>;
}

/// A forward-geocoding query and its constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeQuery {
    pub text: String,
    /// Bias results towards this point.
    pub proximity: Option<GeoPoint>,
    /// ISO 3166 alpha-2 country filter.
    pub country: Option<String>,
    pub limit: usize,
}

impl GeocodeQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            proximity: None,
            country: None,
            limit: 1,
        }
    }

    pub fn near(mut self, point: GeoPoint) -> Self {
        self.proximity = Some(point);
        self
    }

    pub fn in_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub coordinates: GeoPoint,
    /// Full label, e.g. "2700 Crow Canyon Rd, San Ramon, California 94583, United States".
    pub display_name: String,
    /// Short label, e.g. "Crow Canyon Road".
    pub short_name: String,
}

pub trait Geocoder {
    /// Matches ordered by relevance. No match is `Ok` with an empty list.
    fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>, ServiceError>;
}

/// An optimized trip over a set of waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    /// `visit_order[i]` is the index into the input waypoints of the i-th stop
    /// on the trip.
    pub visit_order: Vec<usize>,
    pub legs: serde_json::Value,
    pub geometry: Polyline,
}

pub trait TripOptimizer {
    /// Orders and routes `waypoints`. With `fix_first` the first waypoint is
    /// the trip origin, with `fix_last` the last waypoint is its destination;
    /// every other waypoint may be visited in any order.
    ///
    /// `Ok(None)` means the provider found no trip.
    fn optimize_trip(
        &self,
        waypoints: &[GeoPoint],
        fix_first: bool,
        fix_last: bool,
    ) -> Result<Option<Trip>, ServiceError>;
}

impl<T: ChatCompletion + ?Sized> ChatCompletion for &T {
    fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, ServiceError> {
        (**self).complete(messages)
    }
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>, ServiceError> {
        (**self).geocode(query)
    }
}

impl<T: TripOptimizer + ?Sized> TripOptimizer for &T {
    fn optimize_trip(
        &self,
        waypoints: &[GeoPoint],
        fix_first: bool,
        fix_last: bool,
    ) -> Result<Option<Trip>, ServiceError> {
        (**self).optimize_trip(waypoints, fix_first, fix_last)
    }
}

impl<T: ChatCompletion + ?Sized> ChatCompletion for Box<T> {
    fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, ServiceError> {
        (**self).complete(messages)
    }
}

impl<T: Geocoder + ?Sized> Geocoder for Box<T> {
    fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>, ServiceError> {
        (**self).geocode(query)
    }
}

impl<T: TripOptimizer + ?Sized> TripOptimizer for Box<T> {
    fn optimize_trip(
        &self,
        waypoints: &[GeoPoint],
        fix_first: bool,
        fix_last: bool,
    ) -> Result<Option<Trip>, ServiceError> {
        (**self).optimize_trip(waypoints, fix_first, fix_last)
    }
}
