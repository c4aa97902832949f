//! Data models for the USGS summary feed and the normalized record.
//!
//! The raw structures mirror only the GeoJSON fields the dashboard
//! consumes; everything else in the feed is ignored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::FetchError;

/// Fallback for events the feed reports without a place name.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// A single raw event from the feed's `features` array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    /// Event ID assigned by the contributing network
    pub id: String,

    /// Geographic location
    pub geometry: RawGeometry,

    /// Event properties
    pub properties: RawProperties,
}

/// Geometry of a raw event.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGeometry {
    /// Coordinates: [longitude, latitude, depth_km]
    pub coordinates: Vec<f64>,
}

/// The subset of event properties the dashboard reads.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProperties {
    /// Magnitude value, null for some automatic solutions
    pub mag: Option<f64>,

    /// Human-readable place description
    pub place: Option<String>,

    /// Event time (ms since epoch)
    pub time: i64,

    /// Event page URL
    pub url: Option<String>,
}

impl RawFeature {
    /// Map the raw event into the fixed record shape, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the ID is empty or the coordinate
    /// tuple does not hold exactly three values.
    pub fn normalize(self) -> Result<EarthquakeRecord, FetchError> {
        if self.id.is_empty() {
            return Err(FetchError::malformed("empty event ID"));
        }
        let [longitude, latitude, depth_km] = self.geometry.coordinates[..] else {
            return Err(FetchError::malformed(format!(
                "event {}: expected 3 coordinates, got {}",
                self.id,
                self.geometry.coordinates.len()
            )));
        };

        Ok(EarthquakeRecord {
            id: self.id,
            magnitude: self.properties.mag,
            place: self
                .properties
                .place
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            time_utc: self.properties.time,
            longitude,
            latitude,
            depth_km,
            info_url: self.properties.url.unwrap_or_default(),
        })
    }
}

/// A normalized earthquake event.
///
/// Records are built once per fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeRecord {
    pub id: String,
    pub magnitude: Option<f64>,
    pub place: String,
    /// Event time (ms since epoch)
    pub time_utc: i64,
    pub longitude: f64,
    pub latitude: f64,
    /// Depth in kilometers (positive down, unclamped)
    pub depth_km: f64,
    pub info_url: String,
}

/// Parse a feed body into normalized records, in the order received.
///
/// # Errors
///
/// Returns `MalformedPayload` if the body is not JSON, has no top-level
/// `features` array, an entry lacks a required field, or two entries
/// share an ID.
pub fn parse_feed(body: &str) -> Result<Vec<EarthquakeRecord>, FetchError> {
    let mut root: Value = serde_json::from_str(body)?;

    let Some(Value::Array(features)) = root.get_mut("features").map(Value::take) else {
        return Err(FetchError::malformed("features array missing"));
    };

    let mut seen = HashSet::with_capacity(features.len());
    let mut records = Vec::with_capacity(features.len());

    for feature in features {
        let raw: RawFeature = serde_json::from_value(feature)?;
        let record = raw.normalize()?;
        if !seen.insert(record.id.clone()) {
            return Err(FetchError::malformed(format!(
                "duplicate event ID {}",
                record.id
            )));
        }
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a record with the fields the pipeline tests care about.
    pub(crate) fn record(id: &str, magnitude: Option<f64>) -> EarthquakeRecord {
        EarthquakeRecord {
            id: id.to_string(),
            magnitude,
            place: format!("near {id}"),
            time_utc: 1_700_000_000_000,
            longitude: 139.69,
            latitude: 35.68,
            depth_km: 10.0,
            info_url: format!("https://earthquake.usgs.gov/earthquakes/eventpage/{id}"),
        }
    }

    #[test]
    fn test_null_fields_degrade_to_defaults() {
        let body = r#"{"features":[{"id":"a","properties":{"mag":null,"place":null,"time":1000},"geometry":{"coordinates":[1,2,3]}}]}"#;
        let records = parse_feed(body).unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "a");
        assert_eq!(r.magnitude, None);
        assert_eq!(r.place, UNKNOWN_LOCATION);
        assert_eq!(r.time_utc, 1000);
        assert!((r.longitude - 1.0).abs() < f64::EPSILON);
        assert!((r.latitude - 2.0).abs() < f64::EPSILON);
        assert!((r.depth_km - 3.0).abs() < f64::EPSILON);
        assert_eq!(r.info_url, "");
    }

    #[test]
    fn test_missing_features_is_malformed() {
        assert!(matches!(
            parse_feed("{}"),
            Err(FetchError::MalformedPayload(_))
        ));
        assert!(matches!(
            parse_feed(r#"{"features":{"id":"a"}}"#),
            Err(FetchError::MalformedPayload(_))
        ));
        assert!(matches!(
            parse_feed("not json"),
            Err(FetchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_missing_required_fields_fail_batch() {
        let no_time = r#"{"features":[{"id":"a","properties":{"mag":1.0},"geometry":{"coordinates":[1,2,3]}}]}"#;
        assert!(matches!(
            parse_feed(no_time),
            Err(FetchError::MalformedPayload(_))
        ));

        let short_coords = r#"{"features":[{"id":"a","properties":{"time":1},"geometry":{"coordinates":[1,2]}}]}"#;
        assert!(matches!(
            parse_feed(short_coords),
            Err(FetchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let body = r#"{"features":[
            {"id":"a","properties":{"time":1},"geometry":{"coordinates":[1,2,3]}},
            {"id":"a","properties":{"time":2},"geometry":{"coordinates":[1,2,3]}}
        ]}"#;
        assert!(matches!(
            parse_feed(body),
            Err(FetchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_order_and_extremes_preserved() {
        let body = r#"{"type":"FeatureCollection","metadata":{"count":2},"features":[
            {"id":"deep","properties":{"mag":-0.4,"place":"Fiji","time":5,"url":"u1","tsunami":0},"geometry":{"type":"Point","coordinates":[178.1,-17.9,702.5]}},
            {"id":"air","properties":{"mag":6.8,"place":"Alaska","time":3,"url":"u2"},"geometry":{"coordinates":[-150.0,61.0,-2.1]}}
        ]}"#;
        let records = parse_feed(body).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["deep", "air"]);
        assert_eq!(records[0].magnitude, Some(-0.4));
        assert!((records[0].depth_km - 702.5).abs() < f64::EPSILON);
        assert!((records[1].depth_km - (-2.1)).abs() < f64::EPSILON);
        assert_eq!(records[1].info_url, "u2");
    }

    #[test]
    fn test_empty_collection() {
        let records = parse_feed(r#"{"features":[]}"#).unwrap();
        assert!(records.is_empty());
    }
}
