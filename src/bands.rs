//! Magnitude and depth banding used for color coding.
//!
//! Both classifiers are total over `f64`: negative depths fall into the
//! shallow band and very large magnitudes into the high band.

use serde::Serialize;

// ANSI color codes
const GREEN: &str = "\x1b[92m";
const ORANGE: &str = "\x1b[38;5;208m";
const RED: &str = "\x1b[91m";

/// Magnitude at or above which an event is significant.
pub const SIGNIFICANT_MAGNITUDE: f64 = 4.0;

/// Magnitude at or above which an event is major.
pub const MAJOR_MAGNITUDE: f64 = 5.0;

/// Depth (km) beyond which an event is intermediate.
const INTERMEDIATE_DEPTH_KM: f64 = 70.0;

/// Depth (km) beyond which an event is deep.
const DEEP_DEPTH_KM: f64 = 300.0;

/// Severity band for a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeBand {
    /// Below 4.0, or unknown
    Low,
    /// [4.0, 5.0)
    Moderate,
    /// 5.0 and above
    High,
}

impl MagnitudeBand {
    /// Classify a magnitude. Missing magnitudes are `Low`.
    #[must_use]
    pub fn classify(magnitude: Option<f64>) -> Self {
        match magnitude {
            Some(m) if m >= MAJOR_MAGNITUDE => Self::High,
            Some(m) if m >= SIGNIFICANT_MAGNITUDE => Self::Moderate,
            _ => Self::Low,
        }
    }

    /// Marker and badge color.
    #[must_use]
    pub const fn hex_color(self) -> &'static str {
        match self {
            Self::Low => "#10b981",
            Self::Moderate => "#f97316",
            Self::High => "#ef4444",
        }
    }

    /// Terminal color.
    #[must_use]
    pub const fn ansi_color(self) -> &'static str {
        match self {
            Self::Low => GREEN,
            Self::Moderate => ORANGE,
            Self::High => RED,
        }
    }

    /// CSS class suffix for the web UI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// Depth band for a hypocenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthBand {
    /// 70 km or shallower (including above the reference surface)
    Shallow,
    /// (70, 300] km
    Intermediate,
    /// Deeper than 300 km
    Deep,
}

impl DepthBand {
    #[must_use]
    pub fn classify(depth_km: f64) -> Self {
        if depth_km > DEEP_DEPTH_KM {
            Self::Deep
        } else if depth_km > INTERMEDIATE_DEPTH_KM {
            Self::Intermediate
        } else {
            Self::Shallow
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shallow => "Shallow",
            Self::Intermediate => "Intermediate",
            Self::Deep => "Deep",
        }
    }
}
