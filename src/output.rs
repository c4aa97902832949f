//! Output formatters for earthquake records.
//!
//! Terminal output supports human-readable (with colors), JSON, and NDJSON
//! formats. The web UI gets small HTML fragments built from the same
//! records; every interpolated string is HTML-escaped.

use std::io::{self, Write};

use html_escape::{encode_double_quoted_attribute, encode_text};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::bands::{DepthBand, MagnitudeBand};
use crate::models::EarthquakeRecord;
use crate::stats::StatsSnapshot;
use crate::timefmt::{format_ist, format_ist_datetime};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const ICON_QUAKE: &str = "🌍";

/// Shown when a filter leaves nothing to render.
pub const EMPTY_MESSAGE: &str = "No earthquakes found matching your criteria.";

/// Prefix of every user-visible fetch failure.
pub const FAILURE_MESSAGE: &str = "Failed to load earthquake data. Please try again.";

/// Bytes left unescaped in an event ID path segment.
const ID_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// A record plus its derived display attributes.
///
/// This is the structure emitted in JSON/NDJSON output and by the JSON API.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView<'a> {
    #[serde(flatten)]
    pub record: &'a EarthquakeRecord,
    pub time_ist: String,
    pub magnitude_band: MagnitudeBand,
    pub depth_band: DepthBand,
}

impl<'a> From<&'a EarthquakeRecord> for RecordView<'a> {
    fn from(record: &'a EarthquakeRecord) -> Self {
        Self {
            record,
            time_ist: format_ist(record.time_utc),
            magnitude_band: MagnitudeBand::classify(record.magnitude),
            depth_band: DepthBand::classify(record.depth_km),
        }
    }
}

/// Magnitude with one decimal, or `?` when the feed had none.
#[must_use]
pub fn format_magnitude(magnitude: Option<f64>) -> String {
    magnitude.map_or_else(|| "?".into(), |m| format!("{m:.1}"))
}

fn json_error(e: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Write records in human-readable format, color-coded by magnitude band.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, records: &[EarthquakeRecord]) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(writer, "{DIM}{EMPTY_MESSAGE}{RESET}");
    }

    for record in records {
        let color = MagnitudeBand::classify(record.magnitude).ansi_color();
        let mag = format_magnitude(record.magnitude);
        let depth = record.depth_km;
        let depth_label = DepthBand::classify(depth).label();
        let time = format_ist(record.time_utc);

        writeln!(
            writer,
            "{ICON_QUAKE} {color}{BOLD}M{mag:>4}{RESET} │ \
             {time:>11} IST │ \
             {DIM}{depth:>6.1} km ({depth_label}){RESET} │ \
             {place} {DIM}[{id}]{RESET}",
            place = record.place,
            id = record.id,
        )?;
    }
    Ok(())
}

/// Write records as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, records: &[EarthquakeRecord]) -> io::Result<()> {
    let output: Vec<RecordView> = records.iter().map(RecordView::from).collect();
    let json = serde_json::to_string_pretty(&output).map_err(json_error)?;
    writeln!(writer, "{json}")
}

/// Write records as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, records: &[EarthquakeRecord]) -> io::Result<()> {
    for record in records {
        let json = serde_json::to_string(&RecordView::from(record)).map_err(json_error)?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write records in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_records<W: Write>(
    writer: &mut W,
    records: &[EarthquakeRecord],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, records),
        Format::Json => write_json(writer, records),
        Format::Ndjson => write_ndjson(writer, records),
    }
}

/// Write summary counts.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_stats<W: Write>(writer: &mut W, stats: &StatsSnapshot, format: Format) -> io::Result<()> {
    match format {
        Format::Human => {
            let high = MagnitudeBand::High.ansi_color();
            let moderate = MagnitudeBand::Moderate.ansi_color();
            writeln!(writer, "{BOLD}Total{RESET}        {}", stats.total)?;
            writeln!(writer, "{moderate}{BOLD}M4.0+{RESET}        {}", stats.significant)?;
            writeln!(writer, "{high}{BOLD}M5.0+{RESET}        {}", stats.major)
        }
        Format::Json | Format::Ndjson => {
            let json = serde_json::to_string(stats).map_err(json_error)?;
            writeln!(writer, "{json}")
        }
    }
}

/// Write the full attributes of one record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_detail<W: Write>(writer: &mut W, record: &EarthquakeRecord) -> io::Result<()> {
    let color = MagnitudeBand::classify(record.magnitude).ansi_color();

    writeln!(writer, "{BOLD}Earthquake Details{RESET} {DIM}[{}]{RESET}", record.id)?;
    writeln!(writer, "  Location     {}", record.place)?;
    writeln!(
        writer,
        "  Magnitude    {color}{BOLD}{}{RESET}",
        format_magnitude(record.magnitude)
    )?;
    writeln!(writer, "  Depth        {:.1} km", record.depth_km)?;
    writeln!(writer, "  Time (IST)   {}", format_ist_datetime(record.time_utc))?;
    writeln!(
        writer,
        "  Coordinates  {:.4}°, {:.4}°",
        record.latitude, record.longitude
    )?;
    writeln!(writer, "  More info    {}", record.info_url)
}

// ============================================================================
// HTML fragments
// ============================================================================

/// Path of the detail fragment for an event ID.
#[must_use]
pub fn detail_path(id: &str) -> String {
    format!("/earthquakes/{}", utf8_percent_encode(id, ID_SEGMENT))
}

/// One clickable list item.
fn list_item_html(record: &EarthquakeRecord) -> String {
    let band = MagnitudeBand::classify(record.magnitude);
    let depth_label = DepthBand::classify(record.depth_km).label();

    format!(
        r##"<div class="quake-item" hx-get="{path}" hx-target="#detail" hx-swap="innerHTML">
  <div class="mag-badge mag-{band}">{mag}</div>
  <div class="quake-main">
    <h3 class="quake-place">{place}</h3>
    <div class="quake-meta">
      <span>◷ {time}</span>
      <span>↓ {depth:.1} km ({depth_label})</span>
    </div>
  </div>
  <span class="chevron">›</span>
</div>
"##,
        path = detail_path(&record.id),
        band = band.as_str(),
        mag = format_magnitude(record.magnitude),
        place = encode_text(&record.place),
        time = format_ist(record.time_utc),
        depth = record.depth_km,
    )
}

/// Render the record list, or the empty-state message.
#[must_use]
pub fn list_html(records: &[EarthquakeRecord]) -> String {
    if records.is_empty() {
        return format!(r#"<div class="empty-state"><p>{EMPTY_MESSAGE}</p></div>"#);
    }

    records.iter().map(list_item_html).collect()
}

/// Render the detail dialog for one record.
#[must_use]
pub fn detail_html(record: &EarthquakeRecord) -> String {
    format!(
        r#"<div class="modal" onclick="if (event.target === this) this.remove()">
  <div class="modal-card">
    <div class="modal-header">
      <h2>Earthquake Details</h2>
      <button class="btn btn-ghost" onclick="this.closest('.modal').remove()">✕</button>
    </div>
    <dl class="detail-list">
      <dt>Location</dt><dd>{place}</dd>
      <dt>Magnitude</dt><dd class="detail-mag mag-text-{band}">{mag}</dd>
      <dt>Depth</dt><dd>{depth:.1} km</dd>
      <dt>Time (IST)</dt><dd>{time}</dd>
      <dt>Coordinates</dt><dd>{lat:.4}°, {lon:.4}°</dd>
      <dt>More Information</dt><dd><a href="{url}" target="_blank" rel="noopener noreferrer">View on USGS ↗</a></dd>
    </dl>
  </div>
</div>"#,
        place = encode_text(&record.place),
        band = MagnitudeBand::classify(record.magnitude).as_str(),
        mag = format_magnitude(record.magnitude),
        depth = record.depth_km,
        time = format_ist_datetime(record.time_utc),
        lat = record.latitude,
        lon = record.longitude,
        url = encode_double_quoted_attribute(&record.info_url),
    )
}

/// Render the popup shown when a map marker is clicked.
#[must_use]
pub fn popup_html(record: &EarthquakeRecord) -> String {
    format!(
        "<h3>{place}</h3><p><strong>Magnitude:</strong> {mag}</p>\
         <p><strong>Depth:</strong> {depth:.1} km</p>\
         <p><strong>Time:</strong> {time}</p>",
        place = encode_text(&record.place),
        mag = format_magnitude(record.magnitude),
        depth = record.depth_km,
        time = format_ist(record.time_utc),
    )
}

/// Render the stats cards plus the last-updated stamp.
#[must_use]
pub fn stats_html(stats: &StatsSnapshot, window: &str, updated: &str) -> String {
    format!(
        r#"<div class="stat-card"><span class="stat-value">{total}</span><span class="stat-label">Total</span></div>
<div class="stat-card"><span class="stat-value mag-text-moderate">{significant}</span><span class="stat-label">M4.0+</span></div>
<div class="stat-card"><span class="stat-value mag-text-high">{major}</span><span class="stat-label">M5.0+</span></div>
<div class="stat-updated">Past {window} · Last updated {updated} IST</div>"#,
        total = stats.total,
        significant = stats.significant,
        major = stats.major,
        window = encode_text(window),
        updated = encode_text(updated),
    )
}

/// Render a fetch failure with its reason.
#[must_use]
pub fn error_html(reason: &str) -> String {
    format!(
        r#"<div class="error-state"><p>{FAILURE_MESSAGE}</p><p class="error-reason">Error: {}</p></div>"#,
        encode_text(reason)
    )
}
