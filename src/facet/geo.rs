//! Geographic facet shapes.
//!
//! A geo facet is a polygon drawn on a map. It is persisted as a list of
//! `lon lat` pairs and filters records whose coordinates intersect it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VellumError};
use crate::query::escape::escape_phrase;

/// A geographical point with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographical point.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(VellumError::malformed_query(format!(
                "Invalid latitude: {lat} (must be between -90 and 90)"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(VellumError::malformed_query(format!(
                "Invalid longitude: {lon} (must be between -180 and 180)"
            )));
        }

        Ok(GeoPoint { lat, lon })
    }
}

/// A closed polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoShape {
    points: Vec<GeoPoint>,
}

impl GeoShape {
    /// Create a polygon from its corners; the ring is closed if needed.
    pub fn new(mut points: Vec<GeoPoint>) -> Result<Self> {
        if points.len() < 3 {
            return Err(VellumError::malformed_query(
                "a polygon needs at least three points",
            ));
        }
        if points.first() != points.last() {
            points.push(points[0]);
        }
        Ok(GeoShape { points })
    }

    /// Parse `lon lat, lon lat, ...`, optionally wrapped in `POLYGON((...))`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let coordinates = value
            .strip_prefix("POLYGON((")
            .and_then(|v| v.strip_suffix("))"))
            .unwrap_or(value);

        let points = coordinates
            .split(',')
            .map(|pair| {
                let mut parts = pair.split_whitespace();
                let lon = parts.next().and_then(|v| v.parse::<f64>().ok());
                let lat = parts.next().and_then(|v| v.parse::<f64>().ok());
                match (lon, lat, parts.next()) {
                    (Some(lon), Some(lat), None) => GeoPoint::new(lat, lon),
                    _ => Err(VellumError::malformed_query(format!(
                        "invalid coordinate pair '{}'",
                        pair.trim()
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        GeoShape::new(points)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Coordinate list in `lon lat, lon lat` form.
    pub fn to_coordinates(&self) -> String {
        self.points
            .iter()
            .map(|p| format!("{} {}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Well-known-text polygon.
    pub fn to_wkt(&self) -> String {
        format!("POLYGON(({}))", self.to_coordinates())
    }

    /// Filter matching records whose coordinates intersect this shape.
    pub fn to_filter_query(&self, field: &str) -> String {
        format!("{field}:\"Intersects({})\"", escape_phrase(&self.to_wkt()))
    }
}
