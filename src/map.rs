//! Map marker projection and reconciliation.
//!
//! The browser draws markers with Leaflet; this module decides what each
//! marker looks like and which markers change between two snapshots.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::bands::MagnitudeBand;
use crate::models::EarthquakeRecord;
use crate::output;

/// One circle on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Fill color from the magnitude band
    pub color: &'static str,
    /// Popup body (HTML, escaped)
    pub popup: String,
}

impl From<&EarthquakeRecord> for MapMarker {
    fn from(r: &EarthquakeRecord) -> Self {
        Self {
            id: r.id.clone(),
            latitude: r.latitude,
            longitude: r.longitude,
            color: MagnitudeBand::classify(r.magnitude).hex_color(),
            popup: output::popup_html(r),
        }
    }
}

/// Project every record into a marker, keeping feed order.
#[must_use]
pub fn markers(records: &[EarthquakeRecord]) -> Vec<MapMarker> {
    records.iter().map(MapMarker::from).collect()
}

/// Changes needed to move the map from one marker set to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerDiff {
    /// Markers whose IDs were not on the map
    pub added: Vec<MapMarker>,
    /// IDs no longer present
    pub removed: Vec<String>,
    /// Markers whose IDs stayed but whose color, position or popup changed
    pub updated: Vec<MapMarker>,
    /// IDs present in both sets with an identical marker
    pub retained: Vec<String>,
}

impl MarkerDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// The set of markers currently on the map.
#[derive(Debug, Default)]
pub struct MarkerLayer {
    markers: Vec<MapMarker>,
}

impl MarkerLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers in display order.
    #[must_use]
    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    /// Replace the layer with markers for `records` and report the
    /// difference instead of tearing every marker down.
    ///
    /// Markers are keyed by ID. An ID present in both sets is `retained`
    /// only when its whole marker is unchanged, otherwise it is `updated`.
    pub fn reconcile(&mut self, records: &[EarthquakeRecord]) -> MarkerDiff {
        let next = markers(records);

        let previous: HashMap<&str, &MapMarker> =
            self.markers.iter().map(|m| (m.id.as_str(), m)).collect();
        let next_ids: HashSet<&str> = next.iter().map(|m| m.id.as_str()).collect();

        let removed = self
            .markers
            .iter()
            .filter(|m| !next_ids.contains(m.id.as_str()))
            .map(|m| m.id.clone())
            .collect();

        let mut diff = MarkerDiff {
            removed,
            ..MarkerDiff::default()
        };
        for marker in &next {
            match previous.get(marker.id.as_str()) {
                None => diff.added.push(marker.clone()),
                Some(&old) if old == marker => diff.retained.push(marker.id.clone()),
                Some(_) => diff.updated.push(marker.clone()),
            }
        }

        self.markers = next;
        diff
    }
}
