//! Tracker / bell classification: Normal, Warning or Inactive per tank.

use serde::Serialize;

use crate::model::{parse_timestamp, TankReading};

/// Status keywords that make a tank a tracker warning.
pub const WARNING_KEYWORDS: &[&str] = &["warning", "high", "low", "critical", "fault", "alarm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackerState {
    Normal,
    Warning,
    Inactive,
}

impl TrackerState {
    /// Sort rank in the bell dropdown: inactive first, normal last.
    fn rank(self) -> u8 {
        match self {
            TrackerState::Inactive => 0,
            TrackerState::Warning => 1,
            TrackerState::Normal => 2,
        }
    }
}

impl std::fmt::Display for TrackerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerState::Normal => write!(f, "OK"),
            TrackerState::Warning => write!(f, "WARNING"),
            TrackerState::Inactive => write!(f, "INACTIVE"),
        }
    }
}

/// One row of the tank tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerAlert {
    pub tank_no: String,
    pub tank_name: String,
    pub state: TrackerState,
    pub message: String,
    pub happened_at: String,
}

/// Lowercased flow status; `"normal"` when the record has none.
fn flow_status(reading: &TankReading) -> String {
    reading
        .flow_text
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_else(|| "normal".to_string())
}

/// Lowercased tank status, or the flow status when there is no tank status.
pub fn combined_status(reading: &TankReading) -> String {
    if reading.status_text.is_empty() {
        flow_status(reading)
    } else {
        reading.status_text.to_lowercase()
    }
}

/// Inactive when the flow says so, the backend flags the reading stale, or
/// there is no last-update timestamp at all.
pub fn is_inactive(reading: &TankReading) -> bool {
    flow_status(reading) == "inactive"
        || reading.stale_flag == Some(true)
        || reading.last_updated.is_empty()
}

pub fn is_warning(reading: &TankReading) -> bool {
    let status = combined_status(reading);
    WARNING_KEYWORDS.iter().any(|k| status.contains(k))
}

/// Inactive takes precedence over Warning, Warning over Normal.
pub fn classify_tracker(reading: &TankReading) -> TrackerAlert {
    let state = if is_inactive(reading) {
        TrackerState::Inactive
    } else if is_warning(reading) {
        TrackerState::Warning
    } else {
        TrackerState::Normal
    };

    let message = match state {
        TrackerState::Normal => "OK".to_string(),
        TrackerState::Inactive => "No data / Inactive".to_string(),
        TrackerState::Warning => {
            if reading.status_text.is_empty() {
                reading.flow_text.clone().unwrap_or_default()
            } else {
                reading.status_text.clone()
            }
        }
    };

    TrackerAlert {
        tank_no: if reading.tank_no.is_empty() {
            "UNKNOWN".to_string()
        } else {
            reading.tank_no.clone()
        },
        tank_name: reading.location.clone().unwrap_or_default(),
        state,
        message,
        happened_at: reading.last_updated.clone(),
    }
}

pub fn classify_all(readings: &[TankReading]) -> Vec<TrackerAlert> {
    readings.iter().map(classify_tracker).collect()
}

/// Number shown on the bell: every tank that is not Normal.
pub fn bell_count(alerts: &[TrackerAlert]) -> usize {
    alerts.iter().filter(|a| a.state != TrackerState::Normal).count()
}

/// `(ok, warning, inactive)` counts for the dropdown footer.
pub fn tracker_counts(alerts: &[TrackerAlert]) -> (usize, usize, usize) {
    alerts.iter().fold((0, 0, 0), |(ok, warn, inactive), a| match a.state {
        TrackerState::Normal => (ok + 1, warn, inactive),
        TrackerState::Warning => (ok, warn + 1, inactive),
        TrackerState::Inactive => (ok, warn, inactive + 1),
    })
}

/// Dropdown order: Inactive, Warning, Normal; newest first within a state.
/// Rows without a parseable time sort as oldest.
pub fn sort_tracker_rows(alerts: &mut [TrackerAlert]) {
    let millis = |a: &TrackerAlert| {
        parse_timestamp(&a.happened_at)
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    };
    alerts.sort_by(|a, b| {
        a.state
            .rank()
            .cmp(&b.state.rank())
            .then_with(|| millis(b).cmp(&millis(a)))
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
