//! KPI-card classification: online/offline plus an independent issue flag.
//!
//! Offline answers "can we trust any reading from this tank"; issue answers
//! "is the tank reporting something dangerous". A tank with no volume
//! reading is offline but is never an issue on that ground alone.

use serde::Serialize;

use crate::model::TankReading;

/// Keywords that make a status an operational issue. "high" and "low" are
/// intentionally absent here, unlike the tracker's warning list.
pub const ISSUE_KEYWORDS: &[&str] = &["warning", "fault", "critical", "alarm"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiStatus {
    pub combined_status: String,
    pub missing_volume: bool,
    pub derived_offline: bool,
    pub derived_issue: bool,
    /// `"offline"` when offline, otherwise the combined status.
    pub display_status: String,
}

pub fn is_offline_status(status: &str) -> bool {
    let s = status.to_lowercase();
    s == "inactive" || s.contains("inactive") || s.contains("offline")
}

pub fn is_issue_status(status: &str) -> bool {
    let s = status.to_lowercase();
    ISSUE_KEYWORDS.iter().any(|k| s.contains(k))
}

pub fn is_missing_volume(current_level: Option<f64>) -> bool {
    !current_level.is_some_and(f64::is_finite)
}

/// Tank status, else flow status, else `"normal"`, lowercased.
pub fn combined_status(reading: &TankReading) -> String {
    if !reading.status_text.is_empty() {
        reading.status_text.to_lowercase()
    } else if let Some(flow) = reading.flow_text.as_deref() {
        flow.to_lowercase()
    } else {
        "normal".to_string()
    }
}

pub fn classify_kpi(reading: &TankReading) -> KpiStatus {
    let combined_status = combined_status(reading);
    let missing_volume = is_missing_volume(reading.current_level);
    let derived_offline = is_offline_status(&combined_status) || missing_volume;
    let derived_issue = is_issue_status(&combined_status);

    let display_status = if derived_offline {
        "offline".to_string()
    } else {
        combined_status.clone()
    };

    KpiStatus {
        combined_status,
        missing_volume,
        derived_offline,
        derived_issue,
        display_status,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
