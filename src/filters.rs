//! Event filtering logic.
//!
//! The dashboard offers a single minimum-magnitude threshold; the feed
//! window is chosen at fetch time rather than filtered locally.

use crate::client::FeedWindow;
use crate::models::EarthquakeRecord;

/// Filter criteria as entered in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterCriteria {
    /// Minimum magnitude, inclusive. `None` disables filtering.
    pub min_magnitude: Option<f64>,
    /// Which summary feed to query.
    pub window: FeedWindow,
}

impl FilterCriteria {
    /// Apply the magnitude threshold to a record set.
    #[must_use]
    pub fn apply(&self, records: &[EarthquakeRecord]) -> Vec<EarthquakeRecord> {
        filter(records, self.min_magnitude)
    }
}

/// Parse a raw threshold input. Empty or non-numeric input disables filtering.
#[must_use]
pub fn parse_threshold(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|t| !t.is_nan())
}

/// Check a single record against a threshold.
///
/// Records without a magnitude fail any active threshold.
#[must_use]
pub fn passes(record: &EarthquakeRecord, min_magnitude: Option<f64>) -> bool {
    match min_magnitude {
        None => true,
        Some(min) if min.is_nan() => true,
        Some(min) => record.magnitude.is_some_and(|m| m >= min),
    }
}

/// Keep the records at or above `min_magnitude`, preserving order.
///
/// An absent or NaN threshold returns the input unchanged.
#[must_use]
pub fn filter(records: &[EarthquakeRecord], min_magnitude: Option<f64>) -> Vec<EarthquakeRecord> {
    records
        .iter()
        .filter(|r| passes(r, min_magnitude))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::record;

    fn sample() -> Vec<EarthquakeRecord> {
        vec![
            record("a", Some(2.1)),
            record("b", Some(5.4)),
            record("c", None),
            record("d", Some(4.0)),
            record("e", Some(-0.3)),
            record("f", Some(3.99)),
        ]
    }

    fn ids(records: &[EarthquakeRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_no_threshold_is_identity() {
        let records = sample();
        assert_eq!(filter(&records, None), records);
        assert_eq!(filter(&records, Some(f64::NAN)), records);
    }

    #[test]
    fn test_threshold_inclusive_and_ordered() {
        let records = sample();
        let out = filter(&records, Some(4.0));
        assert_eq!(ids(&out), ["b", "d"]);
    }

    #[test]
    fn test_missing_magnitude_excluded_when_active() {
        let records = sample();
        let out = filter(&records, Some(-10.0));
        assert_eq!(ids(&out), ["a", "b", "d", "e", "f"]);
    }

    #[test]
    fn test_idempotent() {
        let records = sample();
        for t in [-1.0, 0.0, 2.5, 3.99, 4.0, 5.4, 8.0] {
            let once = filter(&records, Some(t));
            assert!(once.iter().all(|r| r.magnitude.is_some_and(|m| m >= t)));
            assert_eq!(filter(&once, Some(t)), once);
        }
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("4.5"), Some(4.5));
        assert_eq!(parse_threshold(" 3 "), Some(3.0));
        assert_eq!(parse_threshold(""), None);
        assert_eq!(parse_threshold("abc"), None);
        assert_eq!(parse_threshold("NaN"), None);
    }

    #[test]
    fn test_criteria_apply() {
        let criteria = FilterCriteria {
            min_magnitude: Some(5.0),
            window: FeedWindow::Week,
        };
        assert_eq!(ids(&criteria.apply(&sample())), ["b"]);
    }
}
