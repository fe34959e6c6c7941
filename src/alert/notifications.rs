//! Notification normalization, de-duplication and filtering.
//!
//! The backend's notification feed repeats rows and mixes in routine "OK"
//! entries. Only warning and critical alerts are shown, once each.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::model::NotificationRecord;
use crate::resolve::{as_flag, pick_number, pick_string, pick_value};

const NORMAL_WORDS: &[&str] = &["ok", "normal", "running", "healthy"];

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Turns one raw `/notifications` row into a `NotificationRecord`.
///
/// `disable_alert` is inverted into `alert_enabled`; without it an explicit
/// `alert_enabled` is used as-is, and otherwise alerts stay enabled.
pub fn normalize_notification(row: &Value, index: usize) -> NotificationRecord {
    let tank_id = pick_string(row, &["tankNo", "tank_no"]);
    let timestamp = pick_string(row, &["timestamp", "current_time", "date_time", "time"]);

    let status = pick_string(row, &["tankStatus", "tank_status"]);
    let status_text = if status.is_empty() { "Normal".to_string() } else { status };

    let under_maintenance = pick_value(row, &["underMaintenance", "under_maintenance"])
        .and_then(as_flag)
        .unwrap_or(false);

    let alert_enabled = pick_value(row, &["disable_alert", "alertDisabled"])
        .and_then(as_flag)
        .map(|disabled| !disabled)
        .or_else(|| pick_value(row, &["alertEnabled", "alert_enabled"]).and_then(as_flag))
        .unwrap_or(true);

    let id = {
        let explicit = pick_string(row, &["id"]);
        if explicit.is_empty() {
            format!(
                "{}-{}-{}",
                if tank_id.is_empty() { "TANK" } else { tank_id.as_str() },
                if timestamp.is_empty() { "ts" } else { timestamp.as_str() },
                index
            )
        } else {
            explicit
        }
    };

    NotificationRecord {
        id,
        place: pick_string(row, &["place", "location"]),
        status_text,
        alert_message: pick_string(row, &["alertMessage", "tank_alert_message", "alert_type"]),
        under_maintenance,
        alert_enabled,
        level: pick_number(row, &["level", "currentLevel"]),
        fill_percentage: pick_number(row, &["fillPercentage", "fill_percentage"]),
        tank_id,
        timestamp,
    }
}

pub fn normalize_notifications(rows: &[Value]) -> Vec<NotificationRecord> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| normalize_notification(r, i))
        .collect()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// `ok` / `normal` / `running` / `healthy`, case-insensitive, as the whole
/// text or anywhere inside it ("Normal level", "OK - running").
pub fn is_normal_text(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    !lower.is_empty() && NORMAL_WORDS.iter().any(|word| lower.contains(word))
}

/// Status column text: normal statuses read "Normal", blanks read "--".
pub fn display_tank_status(status: &str) -> String {
    if is_normal_text(status) {
        "Normal".to_string()
    } else if status.trim().is_empty() {
        "--".to_string()
    } else {
        status.trim().to_string()
    }
}

/// A normal tank always shows "Normal", whatever its message says;
/// otherwise the message, or "Warning" when there is none.
pub fn display_alert_type(alert_message: &str, status: &str) -> String {
    if is_normal_text(status) {
        return "Normal".to_string();
    }
    let msg = alert_message.trim();
    if msg.is_empty() {
        "Warning".to_string()
    } else {
        msg.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// Severity of an alert that survived filtering.
pub fn alert_severity(record: &NotificationRecord) -> AlertSeverity {
    let text = format!("{} {}", record.status_text, record.alert_message).to_lowercase();
    if ["critical", "alarm", "fault"].iter().any(|k| text.contains(k)) {
        AlertSeverity::Critical
    } else {
        AlertSeverity::Warning
    }
}

// ---------------------------------------------------------------------------
// De-duplication and filtering
// ---------------------------------------------------------------------------

/// Drops repeated `(tank, timestamp)` pairs. The first occurrence wins and
/// input order is preserved.
pub fn dedup_notifications(records: Vec<NotificationRecord>) -> Vec<NotificationRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(format!("{}_{}", r.tank_id, r.timestamp)))
        .collect()
}

/// Keeps only rows whose status and derived alert type are both non-normal.
pub fn filter_alerts(records: Vec<NotificationRecord>) -> Vec<NotificationRecord> {
    records
        .into_iter()
        .filter(|r| {
            !is_normal_text(&r.status_text)
                && !is_normal_text(&display_alert_type(&r.alert_message, &r.status_text))
        })
        .collect()
}

/// The full notifications pipeline: normalize, de-duplicate, filter.
pub fn prepare_notifications(rows: &[Value]) -> Vec<NotificationRecord> {
    filter_alerts(dedup_notifications(normalize_notifications(rows)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_maps_snake_case_fields() {
        let r = normalize_notification(
            &json!({
                "tank_no": "BS-11",
                "location": "Battery-5 WF",
                "tank_status": "Warning",
                "tank_alert_message": "High level",
                "under_maintenance": 1,
                "disable_alert": "1",
                "current_time": "2024-05-01T10:00:00Z",
                "fill_percentage": 91.5
            }),
            0,
        );
        assert_eq!(r.tank_id, "BS-11");
        assert_eq!(r.place, "Battery-5 WF");
        assert_eq!(r.status_text, "Warning");
        assert_eq!(r.alert_message, "High level");
        assert!(r.under_maintenance);
        assert!(!r.alert_enabled, "disable_alert=1 means alerts are off");
        assert_eq!(r.timestamp, "2024-05-01T10:00:00Z");
        assert_eq!(r.fill_percentage, Some(91.5));
        assert_eq!(r.id, "BS-11-2024-05-01T10:00:00Z-0");
    }

    #[test]
    fn test_normalize_defaults() {
        let r = normalize_notification(&json!({}), 7);
        assert_eq!(r.status_text, "Normal");
        assert!(r.alert_enabled);
        assert!(!r.under_maintenance);
        assert_eq!(r.id, "TANK-ts-7");
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let rows = vec![
            json!({ "tank_no": "A", "timestamp": "t1", "tank_status": "Warning", "alertMessage": "first" }),
            json!({ "tank_no": "A", "timestamp": "t1", "tank_status": "Critical", "alertMessage": "second" }),
            json!({ "tank_no": "A", "timestamp": "t2", "tank_status": "Warning" }),
        ];
        let out = dedup_notifications(normalize_notifications(&rows));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].alert_message, "first", "first-inserted duplicate must survive");
        assert_eq!(out[1].timestamp, "t2");
    }

    #[test]
    fn test_normal_rows_are_filtered_out() {
        let rows = vec![
            json!({ "tank_no": "A", "timestamp": "t1", "tank_status": "OK", "alertMessage": "High level" }),
            json!({ "tank_no": "B", "timestamp": "t1", "tank_status": "Running" }),
            json!({ "tank_no": "C", "timestamp": "t1", "tank_status": "Warning", "alertMessage": "Low level" }),
            json!({ "tank_no": "D", "timestamp": "t1", "tank_status": "Critical" }),
            json!({ "tank_no": "E", "timestamp": "t1", "tank_status": "Warning", "alertMessage": "normal" }),
        ];
        let out = prepare_notifications(&rows);
        let tanks: Vec<_> = out.iter().map(|r| r.tank_id.as_str()).collect();
        assert_eq!(tanks, vec!["C", "D"]);
    }

    #[test]
    fn test_alert_type_display() {
        assert_eq!(display_alert_type("High level", "OK"), "Normal");
        assert_eq!(display_alert_type("", "Warning"), "Warning");
        assert_eq!(display_alert_type(" Low level ", "Warning"), "Low level");
        assert_eq!(display_tank_status("ok"), "Normal");
        assert_eq!(display_tank_status(""), "--");
    }

    #[test]
    fn test_normal_text_matching() {
        assert!(is_normal_text("OK"));
        assert!(is_normal_text("Healthy"));
        assert!(is_normal_text("Normal level"));
        assert!(is_normal_text("pump RUNNING"));
        assert!(is_normal_text("Sensor broken"), "substring match also fires inside a word");
        assert!(!is_normal_text("Warning"));
        assert!(!is_normal_text("High level"));
        assert!(!is_normal_text(""));
    }

    #[test]
    fn test_severity() {
        let mut r = normalize_notification(&json!({ "tank_status": "Warning" }), 0);
        assert_eq!(alert_severity(&r), AlertSeverity::Warning);
        r.alert_message = "Pump fault".to_string();
        assert_eq!(alert_severity(&r), AlertSeverity::Critical);
    }
}
