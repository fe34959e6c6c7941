//! Presentation adapters: chart series and CSV tables.
//!
//! These only reshape data that has already been classified or sanitized;
//! chart rendering and PDF generation happen elsewhere.

use serde_json::Value;

use crate::analysis::kpi::KpiRow;
use crate::analysis::sanitize::LevelSanitizer;
use crate::forms::NormalizedTankRow;
use crate::ingest::api::{OfflineLogEntry, SmsLogEntry};
use crate::model::{parse_timestamp, HistoryPoint, NotificationRecord};
use crate::resolve::{pick_number, pick_string};
use crate::alert::notifications::{display_alert_type, display_tank_status};

const HISTORY_TIME_KEYS: &[&str] = &["date_time", "timestamp", "current_time"];
const HISTORY_LEVEL_KEYS: &[&str] = &["volume_percentage", "fillPercentage", "fill_percentage"];

// ============================================================================
// Chart series
// ============================================================================

/// Runs `(epoch_ms, raw_level)` pairs through one fresh sanitizer, in the
/// order given. Callers pass chronologically-ordered input.
pub fn build_level_series(points: &[(i64, f64)]) -> Vec<HistoryPoint> {
    let mut filter = LevelSanitizer::new();
    points
        .iter()
        .map(|&(timestamp, raw_value)| HistoryPoint {
            timestamp,
            raw_value,
            smoothed_value: filter.push(raw_value),
        })
        .collect()
}

/// Builds the "Volume %" chart series from raw `/tanks/history` rows.
///
/// Rows whose timestamp does not parse or whose level is not a finite number
/// are skipped before they reach the sanitizer.
pub fn history_series(rows: &[Value]) -> Vec<HistoryPoint> {
    let points: Vec<(i64, f64)> = rows
        .iter()
        .filter_map(|row| {
            let at = parse_timestamp(&pick_string(row, HISTORY_TIME_KEYS))?;
            let level = pick_number(row, HISTORY_LEVEL_KEYS)?;
            Some((at.timestamp_millis(), level))
        })
        .collect();
    build_level_series(&points)
}

// ============================================================================
// CSV
// ============================================================================

/// The fixed tables the dashboard can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    OfflineLog,
    SmsLog,
    TankParameters,
    KpiRows,
    Notifications,
}

impl ReportKind {
    pub fn header(self) -> &'static [&'static str] {
        match self {
            ReportKind::OfflineLog => &["SL NO", "Tank Name", "Offline Time", "Online Time", "Offline Period"],
            ReportKind::SmsLog => &["SL NO", "User", "Phone", "Tank Name", "Time"],
            ReportKind::TankParameters => &[
                "SL_NO",
                "TANK_NO",
                "SIM_NUMBER",
                "IMEI_NUMBER",
                "SSID",
                "SAFE_MAX_LEVEL_L",
                "SAFE_MIN_LEVEL_L",
                "TANK_STATUS",
                "ULTRASONIC_STATUS",
                "INSTALLATION_DATE",
            ],
            ReportKind::KpiRows => &["Tank", "Location", "Status", "Level", "Capacity", "Fill %", "Last Update", "Reason"],
            ReportKind::Notifications => &["Tank", "Place", "Tank Status", "Alert Type", "Time"],
        }
    }

    /// Suggested download file name.
    pub fn file_name(self) -> &'static str {
        match self {
            ReportKind::OfflineLog => "offline_log.csv",
            ReportKind::SmsLog => "sms_log.csv",
            ReportKind::TankParameters => "tank_parameters.csv",
            ReportKind::KpiRows => "tank_status.csv",
            ReportKind::Notifications => "notifications.csv",
        }
    }
}

/// Quotes one field: wrapped in `"` with inner quotes doubled.
pub fn csv_escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Header row, then one quoted row per record, newline-separated.
pub fn to_csv(kind: ReportKind, rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        kind.header()
            .iter()
            .map(|h| csv_escape(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(row.iter().map(|f| csv_escape(f)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Offline/online transitions. `start_index` is the zero-based offset of the
/// first row (page offset) so serial numbers continue across pages.
pub fn offline_log_csv(entries: &[OfflineLogEntry], start_index: usize) -> String {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            vec![
                (start_index + i + 1).to_string(),
                e.tankname.clone(),
                e.offline_time.clone().unwrap_or_default(),
                e.online_time.clone().unwrap_or_default(),
                value_text(&e.duration),
            ]
        })
        .collect();
    to_csv(ReportKind::OfflineLog, &rows)
}

pub fn sms_log_csv(entries: &[SmsLogEntry], start_index: usize) -> String {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            vec![
                (start_index + i + 1).to_string(),
                e.user.name.clone(),
                e.user.phone.clone(),
                e.tank_name.clone(),
                e.time.clone(),
            ]
        })
        .collect();
    to_csv(ReportKind::SmsLog, &rows)
}

pub fn tank_parameters_csv(rows: &[NormalizedTankRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.tank_no.clone(),
                r.sim_number.clone(),
                r.imei_number.clone(),
                r.ssid.clone(),
                opt_num(r.safe_max_level_l),
                opt_num(r.safe_min_level_l),
                r.tank_status.clone(),
                r.ultrasonic_status.clone(),
                r.install_date.clone().unwrap_or_default(),
            ]
        })
        .collect();
    to_csv(ReportKind::TankParameters, &rows)
}

pub fn kpi_rows_csv(rows: &[KpiRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.label.clone(),
                r.location.clone().unwrap_or_default(),
                r.status.clone(),
                opt_num(r.current_level),
                opt_num(r.capacity),
                r.fill_percentage.map(|p| format!("{:.1}", p)).unwrap_or_default(),
                r.last_update_text.clone().unwrap_or_default(),
                r.issue_reason.clone().unwrap_or_default(),
            ]
        })
        .collect();
    to_csv(ReportKind::KpiRows, &rows)
}

pub fn notifications_csv(records: &[NotificationRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.tank_id.clone(),
                r.place.clone(),
                display_tank_status(&r.status_text),
                display_alert_type(&r.alert_message, &r.status_text),
                r.timestamp.clone(),
            ]
        })
        .collect();
    to_csv(ReportKind::Notifications, &rows)
}

// ============================================================================
// Tests
// ============================================================================
