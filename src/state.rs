//! Shared application state for the dashboard.
//!
//! The current record set lives in an immutable [`Snapshot`] behind an
//! `Arc`. A refresh builds a complete new snapshot and swaps the pointer,
//! so readers see either the old set or the new one, never a mix.
//!
//! Refreshes are ticketed. A fetch that completes after a later request
//! has already been installed is dropped instead of overwriting newer data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::client::{FeedClient, FeedWindow};
use crate::errors::FetchError;
use crate::filters;
use crate::map::{MapMarker, MarkerDiff, MarkerLayer};
use crate::models::EarthquakeRecord;
use crate::stats::{self, StatsSnapshot};
use crate::timefmt;

/// One fetch result plus everything derived from it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Ticket of the refresh that produced this snapshot (0 = nothing loaded)
    pub generation: u64,
    /// Generation this snapshot replaced
    pub previous_generation: u64,
    pub window: FeedWindow,
    pub records: Vec<EarthquakeRecord>,
    pub stats: StatsSnapshot,
    pub markers: Vec<MapMarker>,
    /// Marker changes relative to `previous_generation`
    pub marker_changes: MarkerDiff,
    /// IST wall clock at install time
    pub updated: String,
}

impl Snapshot {
    /// The state before the first successful fetch.
    #[must_use]
    pub fn empty(window: FeedWindow) -> Self {
        Self {
            generation: 0,
            previous_generation: 0,
            window,
            records: Vec::new(),
            stats: StatsSnapshot::default(),
            markers: Vec::new(),
            marker_changes: MarkerDiff::default(),
            updated: String::from("never"),
        }
    }

    /// Look up a record by ID.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&EarthquakeRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records passing a magnitude threshold, in feed order.
    #[must_use]
    pub fn filtered(&self, min_magnitude: Option<f64>) -> Vec<EarthquakeRecord> {
        filters::filter(&self.records, min_magnitude)
    }
}

/// What happened to a completed refresh.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// The fetch result is now the current snapshot
    Installed(Arc<Snapshot>),
    /// A later refresh was installed first; this result was dropped
    Superseded { ticket: u64, current: Arc<Snapshot> },
}

impl RefreshOutcome {
    /// The snapshot that is current after this refresh.
    #[must_use]
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        match self {
            Self::Installed(s) | Self::Superseded { current: s, .. } => s,
        }
    }
}

/// Owned dashboard state shared by all request handlers.
#[derive(Debug)]
pub struct AppState {
    client: FeedClient,
    default_window: FeedWindow,
    current: RwLock<Arc<Snapshot>>,
    layer: Mutex<MarkerLayer>,
    next_ticket: AtomicU64,
}

impl AppState {
    #[must_use]
    pub fn new(client: FeedClient, default_window: FeedWindow) -> Self {
        Self {
            client,
            default_window,
            current: RwLock::new(Arc::new(Snapshot::empty(default_window))),
            layer: Mutex::new(MarkerLayer::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Window used when a refresh does not name one.
    #[must_use]
    pub fn default_window(&self) -> FeedWindow {
        self.default_window
    }

    /// The current snapshot. Cheap: clones an `Arc`.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Reserve a ticket for a refresh that is about to start.
    pub fn begin_refresh(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install a fetch result unless a later ticket already has been.
    pub fn install(
        &self,
        ticket: u64,
        window: FeedWindow,
        records: Vec<EarthquakeRecord>,
    ) -> RefreshOutcome {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        if ticket <= current.generation {
            warn!(
                ticket,
                current = current.generation,
                "dropping superseded refresh result"
            );
            return RefreshOutcome::Superseded {
                ticket,
                current: Arc::clone(&*current),
            };
        }

        let (markers, marker_changes) = {
            let mut layer = self.layer.lock().unwrap_or_else(PoisonError::into_inner);
            let changes = layer.reconcile(&records);
            (layer.markers().to_vec(), changes)
        };
        if marker_changes.is_empty() {
            debug!("map markers unchanged");
        } else {
            debug!(
                added = marker_changes.added.len(),
                removed = marker_changes.removed.len(),
                updated = marker_changes.updated.len(),
                retained = marker_changes.retained.len(),
                "reconciled map markers"
            );
        }

        let snapshot = Arc::new(Snapshot {
            generation: ticket,
            previous_generation: current.generation,
            window,
            stats: stats::summarize(&records),
            markers,
            marker_changes,
            updated: timefmt::now_ist(),
            records,
        });

        info!(
            generation = ticket,
            window = window.as_str(),
            total = snapshot.stats.total,
            "installed new snapshot"
        );

        *current = Arc::clone(&snapshot);
        RefreshOutcome::Installed(snapshot)
    }

    /// Fetch `window` and install the result.
    ///
    /// Blocks on the network call. On failure the current snapshot is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged.
    pub fn refresh(&self, window: FeedWindow) -> Result<RefreshOutcome, FetchError> {
        let ticket = self.begin_refresh();
        debug!(ticket, window = window.as_str(), "refresh started");

        match self.client.fetch(window) {
            Ok(records) => Ok(self.install(ticket, window, records)),
            Err(e) => {
                warn!(ticket, "refresh failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::client::tests::{serve, ONE_EVENT};
    use crate::models::tests::record;

    fn offline_state() -> AppState {
        let client = FeedClient::with_base_url("http://127.0.0.1:9").unwrap();
        AppState::new(client, FeedWindow::Day)
    }

    #[test]
    fn test_starts_empty() {
        let state = offline_state();
        let snap = state.snapshot();
        assert_eq!(snap.generation, 0);
        assert!(snap.records.is_empty());
        assert_eq!(snap.stats, StatsSnapshot::default());
    }

    #[test]
    fn test_install_swaps_whole_snapshot() {
        let state = offline_state();
        let before = state.snapshot();

        let ticket = state.begin_refresh();
        let outcome = state.install(ticket, FeedWindow::Week, vec![record("a", Some(4.5)), record("b", None)]);
        assert!(matches!(outcome, RefreshOutcome::Installed(_)));

        let after = state.snapshot();
        assert_eq!(after.generation, ticket);
        assert_eq!(after.window, FeedWindow::Week);
        assert_eq!(after.stats.total, 2);
        assert_eq!(after.stats.significant, 1);
        assert_eq!(after.markers.len(), 2);
        assert_eq!(after.marker_changes.added.len(), 2);
        assert!(after.find("b").is_some());
        assert!(after.find("zzz").is_none());

        // Readers holding the old Arc still see the old set
        assert!(before.records.is_empty());
    }

    #[test]
    fn test_late_result_is_dropped() {
        let state = offline_state();
        let first = state.begin_refresh();
        let second = state.begin_refresh();

        state.install(second, FeedWindow::Hour, vec![record("new", Some(1.0))]);
        let outcome = state.install(first, FeedWindow::Month, vec![record("old", Some(1.0))]);

        assert!(matches!(outcome, RefreshOutcome::Superseded { ticket, .. } if ticket == first));
        let snap = state.snapshot();
        assert_eq!(snap.generation, second);
        assert_eq!(snap.window, FeedWindow::Hour);
        assert!(snap.find("new").is_some());
        assert!(snap.find("old").is_none());
    }

    #[test]
    fn test_marker_changes_track_previous_generation() {
        let state = offline_state();
        let t1 = state.begin_refresh();
        state.install(t1, FeedWindow::Day, vec![record("a", Some(1.0)), record("b", Some(2.0))]);
        let t2 = state.begin_refresh();
        state.install(t2, FeedWindow::Day, vec![record("b", Some(2.0)), record("c", Some(3.0))]);

        let snap = state.snapshot();
        assert_eq!(snap.previous_generation, t1);
        assert_eq!(snap.marker_changes.removed, ["a"]);
        assert_eq!(snap.marker_changes.retained, ["b"]);
        assert_eq!(snap.marker_changes.added[0].id, "c");

        let t3 = state.begin_refresh();
        state.install(t3, FeedWindow::Day, vec![record("b", Some(4.2)), record("c", Some(3.0))]);
        let snap = state.snapshot();
        assert_eq!(snap.marker_changes.updated[0].id, "b");
        assert_eq!(snap.marker_changes.retained, ["c"]);
        assert_eq!(snap.markers[0].color, "#f97316");
    }

    #[test]
    fn test_failed_refresh_keeps_previous_records() {
        let base = serve(FeedWindow::Day, StatusCode::INTERNAL_SERVER_ERROR, "");
        let state = AppState::new(FeedClient::with_base_url(base).unwrap(), FeedWindow::Day);

        let ticket = state.begin_refresh();
        state.install(ticket, FeedWindow::Day, vec![record("kept", Some(3.3))]);

        let err = state.refresh(FeedWindow::Day).unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(500)));

        let snap = state.snapshot();
        assert_eq!(snap.generation, ticket);
        assert_eq!(snap.records.len(), 1);
        assert_eq!(snap.records[0].id, "kept");
    }

    #[test]
    fn test_refresh_installs_fetched_records() {
        let base = serve(FeedWindow::Month, StatusCode::OK, ONE_EVENT);
        let state = AppState::new(FeedClient::with_base_url(base).unwrap(), FeedWindow::Day);

        let outcome = state.refresh(FeedWindow::Month).unwrap();
        let snap = outcome.snapshot();
        assert_eq!(snap.window, FeedWindow::Month);
        assert_eq!(snap.stats.major, 1);
        assert_eq!(snap.filtered(Some(6.0)).len(), 0);
        assert_eq!(snap.filtered(None).len(), 1);
    }
}
