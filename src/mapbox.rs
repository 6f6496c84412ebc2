//! Mapbox HTTP adapter: forward geocoding and optimized trips.

use serde::Deserialize;

use crate::chat::truncate;
use crate::error::ServiceError;
use crate::geo::GeoPoint;
use crate::osrm::{coordinates_path, needs_round_trip, read_trip_response, trip_query};
use crate::traits::{GeocodeQuery, GeocodeResult, Geocoder, Trip, TripOptimizer};

/// Mapbox caps optimized trips at 12 coordinates.
pub const MAX_TRIP_WAYPOINTS: usize = 12;

#[derive(Debug, Clone)]
pub struct MapboxConfig {
    pub base_url: String,
    pub access_token: String,
    /// Routing profile, e.g. "mapbox/driving" or "mapbox/driving-traffic".
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for MapboxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mapbox.com".to_string(),
            access_token: String::new(),
            profile: "mapbox/driving".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapboxClient {
    config: MapboxConfig,
    client: reqwest::blocking::Client,
}

impl MapboxClient {
    pub fn new(config: MapboxConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn ensure_token(&self) -> Result<(), ServiceError> {
        if self.config.access_token.is_empty() {
            Err(ServiceError::NotConfigured("mapbox access token"))
        } else {
            Ok(())
        }
    }

    fn geocoding_url(&self, query: &GeocodeQuery) -> Result<reqwest::Url, ServiceError> {
        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|err| ServiceError::Transport(format!("invalid mapbox base url: {err}")))?;

        url.path_segments_mut()
            .map_err(|_| ServiceError::Transport("mapbox base url cannot have a path".into()))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", format!("{}.json", query.text).as_str()]);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("access_token", &self.config.access_token);
            pairs.append_pair("limit", &query.limit.max(1).to_string());
            if let Some(point) = query.proximity {
                pairs.append_pair("proximity", &format!("{:.6},{:.6}", point.longitude, point.latitude));
            }
            if let Some(country) = &query.country {
                pairs.append_pair("country", country);
            }
        }
        Ok(url)
    }
}

impl Geocoder for MapboxClient {
    fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>, ServiceError> {
        self.ensure_token()?;
        if query.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self.client.get(self.geocoding_url(query)?).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        Ok(decode_features(response.json::<GeocodingResponse>()?))
    }
}

impl TripOptimizer for MapboxClient {
    fn optimize_trip(
        &self,
        waypoints: &[GeoPoint],
        fix_first: bool,
        fix_last: bool,
    ) -> Result<Option<Trip>, ServiceError> {
        self.ensure_token()?;
        if waypoints.len() < 2 {
            return Ok(None);
        }
        if waypoints.len() > MAX_TRIP_WAYPOINTS {
            return Err(ServiceError::Malformed(format!(
                "{} waypoints exceed the optimization limit of {MAX_TRIP_WAYPOINTS}",
                waypoints.len()
            )));
        }

        let url = format!(
            "{}/optimized-trips/v1/{}/{}",
            self.config.base_url,
            self.config.profile,
            coordinates_path(waypoints)
        );

        let response = self
            .client
            .get(url)
            .query(&trip_query(fix_first, fix_last))
            .query(&[("access_token", self.config.access_token.as_str())])
            .send()?;

        read_trip_response(response, waypoints, needs_round_trip(fix_first, fix_last))
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    /// `[lng, lat]`
    center: Option<[f64; 2]>,
    #[serde(default)]
    place_name: String,
    #[serde(default)]
    text: String,
}

fn decode_features(response: GeocodingResponse) -> Vec<GeocodeResult> {
    response
        .features
        .into_iter()
        .filter_map(|feature| {
            let center = feature.center?;
            Some(GeocodeResult {
                coordinates: GeoPoint::from_lng_lat(center),
                display_name: feature.place_name,
                short_name: feature.text,
            })
        })
        .collect()
}
