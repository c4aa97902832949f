//! Web server for the BhumiKamp dashboard.
//!
//! Provides the earthquake dashboard using:
//! - Axum for HTTP server
//! - HTMX for list, stats and detail fragments
//! - Leaflet for the map tab, fed from a JSON marker endpoint

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::client::FeedWindow;
use crate::filters::parse_threshold;
use crate::map::{MapMarker, MarkerDiff};
use crate::output::{self, RecordView};
use crate::state::{AppState, RefreshOutcome};

/// Event the page listens for to reload the list and the map.
const REFRESHED_EVENT: &str = "quakes-refreshed";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub window: FeedWindow,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            window: FeedWindow::Day,
        }
    }
}

/// Query string for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Raw threshold input; empty or non-numeric means no filter
    #[serde(default)]
    min_magnitude: Option<String>,
}

impl ListParams {
    fn threshold(&self) -> Option<f64> {
        self.min_magnitude.as_deref().and_then(parse_threshold)
    }
}

/// Query string or form body for the refresh endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    #[serde(default)]
    window: Option<String>,
}

/// Map payload: the full marker set plus changes from the previous one.
#[derive(Debug, Serialize)]
struct MarkerPayload<'a> {
    generation: u64,
    previous_generation: u64,
    markers: &'a [MapMarker],
    changes: &'a MarkerDiff,
}

/// Create the Axum router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/earthquakes", get(list_handler))
        .route("/earthquakes/{id}", get(detail_handler))
        .route("/stats", get(stats_handler))
        .route("/refresh", post(refresh_handler))
        .route("/api/earthquakes", get(api_earthquakes_handler))
        .route("/api/stats", get(api_stats_handler))
        .route("/api/markers", get(api_markers_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
///
/// Loads the configured window once before accepting connections. A
/// failed initial load is logged and the server starts empty.
pub async fn run_server(config: ServerConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let initial = Arc::clone(&state);
    let window = config.window;
    match tokio::task::spawn_blocking(move || initial.refresh(window)).await {
        Ok(Ok(outcome)) => tracing::info!(
            "loaded {} events from the {} feed",
            outcome.snapshot().stats.total,
            window
        ),
        Ok(Err(e)) => tracing::warn!("initial fetch failed: {}", e),
        Err(e) => tracing::warn!("initial fetch task failed: {}", e),
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌍 BhumiKamp UI starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler - serves the HTML UI with the current window selected.
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(state.snapshot().window))
}

fn render_index(selected: FeedWindow) -> String {
    let options: String = FeedWindow::ALL
        .iter()
        .map(|&w| {
            let marker = if w == selected { " selected" } else { "" };
            format!(
                r#"<option value="{}"{marker}>Past {}</option>"#,
                w.as_str(),
                w.as_str()
            )
        })
        .collect();
    INDEX_HTML.replace(WINDOW_OPTIONS_SLOT, &options)
}

/// List fragment, filtered by the threshold input.
async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Html<String> {
    let snapshot = state.snapshot();
    Html(output::list_html(&snapshot.filtered(params.threshold())))
}

/// Detail fragment for one record.
async fn detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let snapshot = state.snapshot();
    match snapshot.find(&id) {
        Some(record) => Html(output::detail_html(record)).into_response(),
        None => {
            tracing::debug!("detail requested for unknown event {}", id);
            (StatusCode::NOT_FOUND, Html("<div class='empty-state'><p>Earthquake not found</p></div>"))
                .into_response()
        }
    }
}

/// Stats cards fragment.
async fn stats_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let snapshot = state.snapshot();
    Html(output::stats_html(
        &snapshot.stats,
        snapshot.window.as_str(),
        &snapshot.updated,
    ))
}

/// Refetch the feed.
///
/// Success answers with the stats fragment and triggers a list/map
/// reload. Failure keeps the previous data and swaps an error message
/// into the list area instead.
async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RefreshParams>,
    form: Result<Form<RefreshParams>, FormRejection>,
) -> Response {
    // HTMX posts the selector as a form body; scripts may use the query string
    let requested = form.ok().and_then(|Form(f)| f.window).or(query.window);
    let window = match requested.as_deref().filter(|w| !w.is_empty()) {
        None => state.default_window(),
        Some(raw) => match raw.parse::<FeedWindow>() {
            Ok(w) => w,
            Err(e) => return (StatusCode::BAD_REQUEST, Html(output::error_html(&e))).into_response(),
        },
    };

    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || worker.refresh(window)).await;

    match result {
        Ok(Ok(outcome)) => {
            if let RefreshOutcome::Superseded { ticket, .. } = &outcome {
                tracing::debug!("refresh {} superseded by a later request", ticket);
            }
            let snapshot = outcome.snapshot();
            (
                [("HX-Trigger", REFRESHED_EVENT)],
                Html(output::stats_html(
                    &snapshot.stats,
                    snapshot.window.as_str(),
                    &snapshot.updated,
                )),
            )
                .into_response()
        }
        Ok(Err(e)) => (
            [("HX-Retarget", "#quake-list")],
            Html(output::error_html(&e.to_string())),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("refresh task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(output::error_html("refresh task failed")),
            )
                .into_response()
        }
    }
}

/// Filtered records as JSON.
async fn api_earthquakes_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let snapshot = state.snapshot();
    let records = snapshot.filtered(params.threshold());
    let views: Vec<RecordView> = records.iter().map(RecordView::from).collect();
    Json(views).into_response()
}

/// Summary counts as JSON.
async fn api_stats_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.snapshot().stats).into_response()
}

/// Map markers as JSON.
async fn api_markers_handler(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.snapshot();
    Json(MarkerPayload {
        generation: snapshot.generation,
        previous_generation: snapshot.previous_generation,
        markers: &snapshot.markers,
        changes: &snapshot.marker_changes,
    })
    .into_response()
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

/// Replaced with the window `<option>` list when the page is served.
const WINDOW_OPTIONS_SLOT: &str = "<!-- window-options -->";

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en" data-theme="dark">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>BhumiKamp — Global Earthquakes</title>

    <!-- HTMX -->
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>

    <!-- Leaflet -->
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>

    <style>
        :root {
            --font: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
            --bg-primary: #09090b;
            --bg-elevated: #1c1c1f;
            --bg-hover: #27272a;
            --text-primary: #fafafa;
            --text-secondary: #a1a1aa;
            --border: #27272a;
            --accent: #818cf8;
            --low: #10b981;
            --moderate: #f97316;
            --high: #ef4444;
            --radius-md: 10px;
        }

        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: var(--font);
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }

        .main { max-width: 960px; margin: 0 auto; padding: 1.5rem; }
        h1 { font-size: 1.5rem; font-weight: 700; }
        .subtitle { color: var(--text-secondary); margin-bottom: 1.25rem; }

        /* ===== STATS ===== */
        .stats { display: grid; grid-template-columns: repeat(3, 1fr); gap: 0.75rem; margin-bottom: 1rem; }
        .stat-card {
            background: var(--bg-elevated);
            border: 1px solid var(--border);
            border-radius: var(--radius-md);
            padding: 0.875rem;
            display: flex;
            flex-direction: column;
        }
        .stat-value { font-size: 1.5rem; font-weight: 700; }
        .stat-label { font-size: 0.8125rem; color: var(--text-secondary); }
        .stat-updated { grid-column: 1 / -1; font-size: 0.75rem; color: var(--text-secondary); }

        /* ===== CONTROLS ===== */
        .controls { display: flex; flex-wrap: wrap; gap: 0.5rem; margin-bottom: 1rem; }
        .controls input, .controls select {
            background: var(--bg-elevated);
            color: var(--text-primary);
            border: 1px solid var(--border);
            border-radius: var(--radius-md);
            padding: 0.5rem 0.75rem;
        }
        .btn {
            border: 1px solid var(--border);
            border-radius: var(--radius-md);
            padding: 0.5rem 0.875rem;
            background: var(--bg-elevated);
            color: var(--text-primary);
            cursor: pointer;
        }
        .btn-primary { background: var(--accent); border-color: var(--accent); color: #09090b; }
        .btn-ghost { background: transparent; }
        .tab-active { border-color: var(--accent); color: var(--accent); }
        .hidden { display: none; }

        /* ===== LIST ===== */
        .quake-item {
            display: flex;
            align-items: flex-start;
            gap: 0.75rem;
            padding: 0.875rem;
            margin-bottom: 0.5rem;
            border: 1px solid var(--border);
            border-radius: var(--radius-md);
            background: var(--bg-elevated);
            cursor: pointer;
        }
        .quake-item:hover { background: var(--bg-hover); }
        .quake-main { flex: 1; }
        .quake-place { font-size: 1rem; font-weight: 600; }
        .quake-meta { display: flex; gap: 1rem; font-size: 0.8125rem; color: var(--text-secondary); }
        .chevron { color: var(--text-secondary); }
        .mag-badge { border-radius: 6px; padding: 0.125rem 0.5rem; font-weight: 700; color: #fff; }
        .mag-low { background: var(--low); }
        .mag-moderate { background: var(--moderate); }
        .mag-high { background: var(--high); }
        .mag-text-low { color: var(--low); }
        .mag-text-moderate { color: var(--moderate); }
        .mag-text-high { color: var(--high); }
        .empty-state, .error-state { text-align: center; padding: 2rem; color: var(--text-secondary); }
        .error-state { color: var(--high); }
        .error-reason { font-size: 0.8125rem; margin-top: 0.5rem; }

        /* ===== MAP ===== */
        #map { height: 520px; border-radius: var(--radius-md); border: 1px solid var(--border); }
        .quake-marker {
            width: 16px;
            height: 16px;
            border-radius: 50%;
            border: 2px solid #fff;
            box-shadow: 0 2px 4px rgba(0,0,0,0.3);
        }

        /* ===== DETAIL ===== */
        .modal {
            position: fixed;
            inset: 0;
            background: rgba(0,0,0,0.5);
            display: flex;
            align-items: center;
            justify-content: center;
            z-index: 2000;
            padding: 1rem;
        }
        .modal-card {
            background: var(--bg-elevated);
            border-radius: var(--radius-md);
            max-width: 28rem;
            width: 100%;
            padding: 1.5rem;
        }
        .modal-header { display: flex; justify-content: space-between; margin-bottom: 1rem; }
        .detail-list dt { font-size: 0.8125rem; color: var(--text-secondary); margin-top: 0.75rem; }
        .detail-list dd { font-weight: 500; }
        .detail-mag { font-size: 1.5rem; }
        .detail-list a { color: var(--accent); }
    </style>
</head>
<body>
    <main class="main">
        <h1>BhumiKamp</h1>
        <p class="subtitle">Global earthquakes from the USGS feed</p>

        <div id="stats" class="stats" hx-get="/stats" hx-trigger="load">
            <div class="stat-card"><span class="stat-value">…</span><span class="stat-label">Loading</span></div>
        </div>

        <div class="controls">
            <button class="btn tab-btn tab-active" data-tab="list">List</button>
            <button class="btn tab-btn" data-tab="map">Map</button>

            <input id="min-magnitude" name="min_magnitude" type="number" step="0.1" placeholder="Min magnitude">
            <button class="btn" hx-get="/earthquakes" hx-include="#min-magnitude" hx-target="#quake-list">Apply</button>

            <select id="window" name="window"><!-- window-options --></select>
            <button class="btn btn-primary"
                    hx-post="/refresh"
                    hx-include="#window"
                    hx-target="#stats"
                    hx-trigger="load, click">⟳ Refresh</button>
        </div>

        <div id="listView" class="tab-content">
            <div id="quake-list"
                 hx-get="/earthquakes"
                 hx-include="#min-magnitude"
                 hx-trigger="load, quakes-refreshed from:body">
                <div class="empty-state"><p>Loading seismic data…</p></div>
            </div>
        </div>

        <div id="mapView" class="tab-content hidden">
            <div id="map"></div>
        </div>

        <div id="detail"></div>
    </main>

    <script>
        let map = null;
        let generation = -1;
        const layers = new Map();

        function addMarker(m) {
            const icon = L.divIcon({
                className: '',
                html: '<div class="quake-marker" style="background-color: ' + m.color + '"></div>',
                iconSize: [20, 20],
                iconAnchor: [10, 10]
            });
            const marker = L.marker([m.latitude, m.longitude], { icon }).bindPopup(m.popup).addTo(map);
            layers.set(m.id, marker);
        }

        function removeMarker(id) {
            const marker = layers.get(id);
            if (marker) {
                map.removeLayer(marker);
                layers.delete(id);
            }
        }

        async function syncMarkers() {
            if (!map) return;
            const res = await fetch('/api/markers');
            if (!res.ok) return;
            const data = await res.json();
            if (data.generation === generation) return;

            if (data.previous_generation === generation) {
                data.changes.removed.forEach(removeMarker);
                data.changes.updated.forEach(m => { removeMarker(m.id); addMarker(m); });
                data.changes.added.forEach(addMarker);
            } else {
                Array.from(layers.keys()).forEach(removeMarker);
                data.markers.forEach(addMarker);
            }
            generation = data.generation;
        }

        function showTab(name) {
            document.querySelectorAll('.tab-btn').forEach(b =>
                b.classList.toggle('tab-active', b.dataset.tab === name));
            document.querySelectorAll('.tab-content').forEach(c =>
                c.classList.toggle('hidden', c.id !== name + 'View'));

            if (name === 'map') {
                if (!map) {
                    map = L.map('map').setView([20, 0], 2);
                    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
                        attribution: '© OpenStreetMap contributors'
                    }).addTo(map);
                } else {
                    setTimeout(() => map.invalidateSize(), 100);
                }
                syncMarkers();
            }
        }

        document.querySelectorAll('.tab-btn').forEach(b =>
            b.addEventListener('click', () => showTab(b.dataset.tab)));
        document.body.addEventListener('quakes-refreshed', syncMarkers);
    </script>
</body>
</html>
"##;
