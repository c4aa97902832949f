//! Summary statistics over a record set.

use serde::Serialize;

use crate::bands::{MAJOR_MAGNITUDE, SIGNIFICANT_MAGNITUDE};
use crate::models::EarthquakeRecord;

/// Counts shown in the dashboard header.
///
/// `significant` and `major` overlap: a magnitude 6 event counts in both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: usize,
    pub significant: usize,
    pub major: usize,
}

/// Summarize a record set.
///
/// Records without a magnitude count toward `total` only.
#[must_use]
pub fn summarize(records: &[EarthquakeRecord]) -> StatsSnapshot {
    let at_least = |threshold: f64| {
        records
            .iter()
            .filter(|r| r.magnitude.is_some_and(|m| m >= threshold))
            .count()
    };

    StatsSnapshot {
        total: records.len(),
        significant: at_least(SIGNIFICANT_MAGNITUDE),
        major: at_least(MAJOR_MAGNITUDE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::record;

    #[test]
    fn test_empty() {
        assert_eq!(
            summarize(&[]),
            StatsSnapshot {
                total: 0,
                significant: 0,
                major: 0
            }
        );
    }

    #[test]
    fn test_boundaries_inclusive_and_overlapping() {
        let records: Vec<_> = [3.9, 4.0, 5.0, 5.1]
            .iter()
            .enumerate()
            .map(|(i, m)| record(&format!("ev{i}"), Some(*m)))
            .collect();

        assert_eq!(
            summarize(&records),
            StatsSnapshot {
                total: 4,
                significant: 3,
                major: 2
            }
        );
    }

    #[test]
    fn test_missing_magnitude_counts_in_total_only() {
        let records = vec![record("a", None), record("b", Some(6.2))];
        let stats = summarize(&records);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.significant, 1);
        assert_eq!(stats.major, 1);
    }
}
