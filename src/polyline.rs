//! Route geometry as decoded coordinates.
//!
//! Providers hand geometry back as GeoJSON `LineString`s in `[lng, lat]`
//! order. It is decoded once at the client boundary so the rest of the
//! crate only sees [`GeoPoint`]s.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Decodes a GeoJSON `LineString` geometry object.
    ///
    /// Returns `None` for anything that is not a line string of numeric
    /// pairs; an empty coordinate array yields an empty polyline.
    pub fn from_geojson(geometry: &serde_json::Value) -> Option<Self> {
        if geometry.get("type")?.as_str()? != "LineString" {
            return None;
        }

        let points = geometry
            .get("coordinates")?
            .as_array()?
            .iter()
            .map(|pair| {
                let pair = pair.as_array()?;
                let lng = pair.first()?.as_f64()?;
                let lat = pair.get(1)?.as_f64()?;
                Some(GeoPoint::new(lat, lng))
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self::new(points))
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_geojson_swaps_axis_order() {
        let geometry = json!({
            "type": "LineString",
            "coordinates": [[-121.97, 37.76], [-121.95, 37.78]]
        });
        let polyline = Polyline::from_geojson(&geometry).unwrap();
        assert_eq!(
            polyline.points(),
            &[GeoPoint::new(37.76, -121.97), GeoPoint::new(37.78, -121.95)]
        );
    }

    #[test]
    fn test_from_geojson_rejects_other_types() {
        let geometry = json!({"type": "Point", "coordinates": [-121.97, 37.76]});
        assert!(Polyline::from_geojson(&geometry).is_none());
    }

    #[test]
    fn test_from_geojson_rejects_malformed_pairs() {
        let geometry = json!({"type": "LineString", "coordinates": [[-121.97], [1.0, 2.0]]});
        assert!(Polyline::from_geojson(&geometry).is_none());
    }

    #[test]
    fn test_empty_line_string() {
        let geometry = json!({"type": "LineString", "coordinates": []});
        let polyline = Polyline::from_geojson(&geometry).unwrap();
        assert!(polyline.is_empty());
    }

    #[test]
    fn test_into_points() {
        let points = vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)];
        let polyline = Polyline::new(points.clone());
        assert_eq!(polyline.into_points(), points);
    }
}
