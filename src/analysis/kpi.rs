//! KPI card counts and their drill-down rows.
//!
//! Each count is defined on its own: online/offline split on data
//! availability, issues on status keywords. A tank can be offline and not an
//! issue, or online and an issue.

use serde::Serialize;

use crate::alert::kpi_status::{classify_kpi, KpiStatus};
use crate::model::TankReading;

pub const MISSING_VOLUME_REASON: &str = "No volume data (Level missing)";

/// Which KPI card a drill-down belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricKey {
    Total,
    Online,
    Offline,
    Issues,
}

/// One row of a KPI drill-down list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRow {
    pub id: String,
    pub label: String,
    pub location: Option<String>,
    /// `"offline"` or the lowercased combined status.
    pub status: String,
    pub flow_status: String,
    pub tank_status: String,
    pub current_level: Option<f64>,
    pub capacity: Option<f64>,
    pub fill_percentage: Option<f64>,
    pub last_update_text: Option<String>,
    pub issue_reason: Option<String>,
    #[serde(skip)]
    pub classification: KpiStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub issues: usize,
    pub rows_total: Vec<KpiRow>,
    pub rows_online: Vec<KpiRow>,
    pub rows_offline: Vec<KpiRow>,
    pub rows_issues: Vec<KpiRow>,
}

impl KpiSummary {
    pub fn count(&self, key: MetricKey) -> usize {
        match key {
            MetricKey::Total => self.total,
            MetricKey::Online => self.online,
            MetricKey::Offline => self.offline,
            MetricKey::Issues => self.issues,
        }
    }

    pub fn rows(&self, key: MetricKey) -> &[KpiRow] {
        match key {
            MetricKey::Total => &self.rows_total,
            MetricKey::Online => &self.rows_online,
            MetricKey::Offline => &self.rows_offline,
            MetricKey::Issues => &self.rows_issues,
        }
    }

    /// Drill-down heading, e.g. `"Offline Tanks (3)"`.
    pub fn title(&self, key: MetricKey) -> String {
        let name = match key {
            MetricKey::Total => "Total Tanks",
            MetricKey::Online => "Online Tanks",
            MetricKey::Offline => "Offline Tanks",
            MetricKey::Issues => "Issues Detected",
        };
        format!("{} ({})", name, self.count(key))
    }
}

/// The API-provided message, `None` when empty.
fn issue_reason(reading: &TankReading) -> Option<String> {
    Some(reading.alert_message.clone()).filter(|s| !s.is_empty())
}

/// Offline drill-down copy of a row: the missing-volume reason is appended
/// only here.
fn offline_row(row: &KpiRow) -> KpiRow {
    let mut row = row.clone();
    if row.classification.missing_volume {
        row.issue_reason = Some(match row.issue_reason.take() {
            Some(message) => format!("{} | {}", message, MISSING_VOLUME_REASON),
            None => MISSING_VOLUME_REASON.to_string(),
        });
    }
    row
}

pub fn build_row(reading: &TankReading) -> KpiRow {
    let status = classify_kpi(reading);

    let flow_status = match reading.flow_text.as_deref() {
        Some(flow) => flow.to_lowercase(),
        None if reading.stale_flag == Some(true) => "inactive".to_string(),
        None => "normal".to_string(),
    };
    let tank_status = if reading.status_text.is_empty() {
        "ok".to_string()
    } else {
        reading.status_text.to_lowercase()
    };

    KpiRow {
        id: reading.tank_id.clone(),
        label: reading.label.clone(),
        location: reading.location.clone(),
        status: status.display_status.clone(),
        flow_status,
        tank_status,
        current_level: reading.current_level,
        capacity: reading.capacity,
        fill_percentage: reading.fill_percentage,
        last_update_text: Some(reading.last_updated.clone()).filter(|s| !s.is_empty()),
        issue_reason: issue_reason(reading),
        classification: status,
    }
}

/// Folds one poll's readings into the four KPI counts and drill-downs.
/// An empty input yields all zeros and empty lists.
pub fn aggregate(readings: &[TankReading]) -> KpiSummary {
    let rows_total: Vec<KpiRow> = readings.iter().map(build_row).collect();

    let rows_online: Vec<KpiRow> = rows_total
        .iter()
        .filter(|r| !r.classification.derived_offline)
        .cloned()
        .collect();
    let rows_offline: Vec<KpiRow> = rows_total
        .iter()
        .filter(|r| r.classification.derived_offline)
        .map(offline_row)
        .collect();
    let rows_issues: Vec<KpiRow> = rows_total
        .iter()
        .filter(|r| r.classification.derived_issue)
        .cloned()
        .collect();

    KpiSummary {
        total: rows_total.len(),
        online: rows_online.len(),
        offline: rows_offline.len(),
        issues: rows_issues.len(),
        rows_total,
        rows_online,
        rows_offline,
        rows_issues,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn readings(records: &[serde_json::Value]) -> Vec<TankReading> {
        TankReading::from_records(records)
    }

    #[test]
    fn test_empty_input_gives_zeroes() {
        let s = aggregate(&[]);
        assert_eq!((s.total, s.online, s.offline, s.issues), (0, 0, 0, 0));
        assert!(s.rows_total.is_empty());
        assert!(s.rows_online.is_empty());
        assert!(s.rows_offline.is_empty());
        assert!(s.rows_issues.is_empty());
    }

    #[test]
    fn test_three_tank_scenario() {
        let s = aggregate(&readings(&[
            json!({ "tank_no": "A", "status": "OK", "currentLevel": 500 }),
            json!({ "tank_no": "B", "status": "High level", "currentLevel": 900, "alert_message": "Level Warning" }),
            json!({ "tank_no": "C", "status": "OK", "currentLevel": null }),
        ]));

        assert_eq!(s.total, 3);
        assert_eq!(s.offline, 1);
        assert_eq!(s.online, 2);
        let online: Vec<_> = s.rows_online.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(online, vec!["A", "B"]);
        assert_eq!(s.rows_offline[0].id, "C");
        // "High level" is a tracker warning, not a KPI issue: the KPI rule
        // only matches warning/fault/critical/alarm. Worked examples that
        // list B under issues=1 mix the two views.
        assert_eq!(s.issues, 0);
    }

    #[test]
    fn test_missing_volume_reason_only_in_offline_bucket() {
        let s = aggregate(&readings(&[json!({
            "tank_no": "X", "tank_status": "Fault", "alert_message": "Pump fault"
        })]));
        assert_eq!(s.offline, 1);
        assert_eq!(s.issues, 1, "fault counts as an issue even while offline");

        assert_eq!(
            s.rows_offline[0].issue_reason.as_deref(),
            Some("Pump fault | No volume data (Level missing)")
        );
        assert_eq!(
            s.rows_issues[0].issue_reason.as_deref(),
            Some("Pump fault"),
            "issue rows carry the API message only"
        );
        assert_eq!(s.rows_total[0].issue_reason.as_deref(), Some("Pump fault"));
    }

    #[test]
    fn test_missing_volume_alone_is_not_an_issue() {
        let s = aggregate(&readings(&[json!({ "tank_no": "C", "status": "OK" })]));
        assert_eq!(s.issues, 0);
        assert!(s.rows_issues.is_empty());
        assert_eq!(
            s.rows_offline[0].issue_reason.as_deref(),
            Some(MISSING_VOLUME_REASON)
        );
        assert_eq!(s.rows_offline[0].status, "offline");
    }

    #[test]
    fn test_row_defaults_for_flow_and_tank_status() {
        let s = aggregate(&readings(&[json!({ "tank_no": "S", "stale": true, "currentLevel": 1 })]));
        let row = &s.rows_total[0];
        assert_eq!(row.flow_status, "inactive");
        assert_eq!(row.tank_status, "ok");
        assert_eq!(row.issue_reason, None);
        assert_eq!(row.last_update_text, None);
    }

    #[test]
    fn test_titles() {
        let s = aggregate(&readings(&[
            json!({ "tank_no": "A", "status": "Warning", "currentLevel": 1 }),
            json!({ "tank_no": "B", "status": "offline", "currentLevel": 1 }),
        ]));
        assert_eq!(s.title(MetricKey::Total), "Total Tanks (2)");
        assert_eq!(s.title(MetricKey::Online), "Online Tanks (1)");
        assert_eq!(s.title(MetricKey::Offline), "Offline Tanks (1)");
        assert_eq!(s.title(MetricKey::Issues), "Issues Detected (1)");
        assert_eq!(s.rows(MetricKey::Issues)[0].id, "A");
    }
}
