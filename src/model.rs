/// TankReading, HistoryPoint, NotificationRecord, ApiError, ShapeError
/// core data structures and error handling
///
/// Core data types for the tank monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// Readings are rebuilt from raw API records on every poll and dropped once
/// the derived views have been computed; nothing here is persisted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::resolve::{self, pick_flag, pick_number, pick_string};

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One tank as reported by `GET /tank-current/all`, with every value
/// resolved through the field resolver's precedence lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankReading {
    pub tank_id: String,
    pub tank_no: String,
    pub label: String,
    pub location: Option<String>,
    pub current_level: Option<f64>, // litres, or percent on older firmware
    pub capacity: Option<f64>,
    pub fill_percentage: Option<f64>, // always within [0, 100]
    /// Raw tank status (`tank_status` / `status`), empty when absent.
    pub status_text: String,
    /// Raw flow activity signal, independent of the tank status.
    pub flow_text: Option<String>,
    /// Last update exactly as the API sent it; empty when absent.
    pub last_updated: String,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub stale_flag: Option<bool>,
    pub alert_message: String,
    pub safe_min_l: Option<f64>,
    pub safe_max_l: Option<f64>,
}

impl TankReading {
    /// Builds a reading from a loosely-typed API record.
    ///
    /// `index` is the record's position in the response and is only used to
    /// synthesize an identifier when the record carries none.
    pub fn from_record(record: &Value, index: usize) -> Self {
        let current_level = pick_number(record, resolve::CURRENT_LEVEL_KEYS);
        let capacity = pick_number(record, resolve::CAPACITY_KEYS);
        let fill_from_api = pick_number(record, resolve::FILL_PERCENT_KEYS);

        let location = Some(pick_string(record, resolve::LOCATION_KEYS)).filter(|s| !s.is_empty());
        let flow_text = Some(pick_string(record, resolve::FLOW_STATUS_KEYS)).filter(|s| !s.is_empty());
        let last_updated = pick_string(record, resolve::LAST_UPDATED_KEYS);

        TankReading {
            tank_id: resolve::tank_id(record, index),
            tank_no: pick_string(record, resolve::TANK_NO_KEYS),
            label: resolve::tank_label(record),
            location,
            current_level,
            capacity,
            fill_percentage: fill_percentage(fill_from_api, current_level, capacity),
            status_text: pick_string(record, resolve::TANK_STATUS_KEYS),
            flow_text,
            last_updated_at: parse_timestamp(&last_updated),
            last_updated,
            stale_flag: pick_flag(record, resolve::STALE_KEYS),
            alert_message: pick_string(record, resolve::ALERT_MESSAGE_KEYS),
            safe_min_l: pick_number(record, resolve::SAFE_MIN_KEYS),
            safe_max_l: pick_number(record, resolve::SAFE_MAX_KEYS),
        }
    }

    /// Reads every record of a tank list response.
    pub fn from_records(records: &[Value]) -> Vec<TankReading> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| TankReading::from_record(r, i))
            .collect()
    }
}

/// Fill percentage shown for a tank.
///
/// The API value wins when present; otherwise it is computed from level and
/// capacity. A zero capacity yields `None` rather than a division by zero.
/// The result is clamped to `[0, 100]` in both cases.
pub fn fill_percentage(
    from_api: Option<f64>,
    current_level: Option<f64>,
    capacity: Option<f64>,
) -> Option<f64> {
    let computed = match (current_level, capacity) {
        (Some(level), Some(cap)) if cap != 0.0 => Some(level / cap * 100.0),
        _ => None,
    };
    from_api.or(computed).map(clamp_percent)
}

/// Clamps a percentage into `[0, 100]`.
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// One smoothed point of a level history chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub timestamp: i64, // epoch milliseconds
    pub raw_value: f64,
    pub smoothed_value: f64,
}

/// A normalized row of `GET /notifications`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRecord {
    pub id: String,
    pub tank_id: String,
    pub place: String,
    pub timestamp: String,
    pub status_text: String,
    pub alert_message: String,
    pub under_maintenance: bool,
    pub alert_enabled: bool,
    pub level: Option<f64>,
    pub fill_percentage: Option<f64>,
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parses the timestamp formats the backend has been seen to emit.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS[.fff]`
/// without offset (taken as UTC) and a bare `YYYY-MM-DD` (midnight UTC).
/// Returns `None` for anything else, including the empty string.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A response body that is not usable as a list.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// The body claimed to be JSON but did not parse.
    InvalidJson(String),
    /// The JSON parsed but carried no array at the top level or under any
    /// recognized envelope key.
    NoArrayEnvelope,
}

impl std::fmt::Display for ShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeError::InvalidJson(excerpt) => write!(f, "Invalid JSON. First chars: {}", excerpt),
            ShapeError::NoArrayEnvelope => write!(f, "No array found in response"),
        }
    }
}

impl std::error::Error for ShapeError {}

/// Errors that can arise when talking to the tank backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    Network(String),
    /// Non-2xx HTTP response.
    Http {
        status: u16,
        url: String,
        body_excerpt: String,
    },
    /// A 2xx response whose content type is not JSON.
    NotJson {
        content_type: String,
        excerpt: String,
    },
    /// `{ ok: false, error: "..." }` envelope.
    Logical(String),
    /// The body could not be turned into a list.
    Shape(ShapeError),
}

impl ApiError {
    /// Shape errors degrade to an empty list; everything else is surfaced.
    pub fn is_shape(&self) -> bool {
        matches!(self, ApiError::Shape(_))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http { status, url, body_excerpt } => {
                write!(f, "HTTP error: {} on {}: {}", status, url, body_excerpt)
            }
            ApiError::NotJson { content_type, excerpt } => {
                write!(f, "Expected JSON but got \"{}\". First chars: {}", content_type, excerpt)
            }
            ApiError::Logical(msg) => write!(f, "API error: {}", msg),
            ApiError::Shape(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ShapeError> for ApiError {
    fn from(e: ShapeError) -> Self {
        ApiError::Shape(e)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

/// A user-entered form value that cannot be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Required(&'static str),
    NotNumeric { field: &'static str, value: String },
    InvalidDate(String),
    LimitsInverted { min: f64, max: f64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Required(field) => write!(f, "{} is required", field),
            ValidationError::NotNumeric { field, value } => {
                write!(f, "{} must be a number, got '{}'", field, value)
            }
            ValidationError::InvalidDate(value) => {
                write!(f, "Invalid date '{}' (use dd/mm/yyyy or yyyy-mm-dd)", value)
            }
            ValidationError::LimitsInverted { min, max } => {
                write!(f, "Safe min level ({}) must not exceed safe max level ({})", min, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
